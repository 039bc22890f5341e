use anyhow::Result;
use clap::Parser;
use std::io::Read;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;

mod cli;
mod compose;
mod post_tool;
mod pre_tool;
mod stop;

use cli::{Cli, HookCommand};
use qv_config::ResolvedConfig;
use qv_core::{Decision, HookEvent, HookPoint, STDERR_PREFIX};

/// Everything a hook pipeline needs, resolved once per invocation.
pub struct HookContext {
    pub event: HookEvent,
    pub config: ResolvedConfig,
    pub project_root: PathBuf,
    pub session_id: String,
    pub audit_dir: PathBuf,
}

fn main() {
    // Tracing goes to stderr; stdout is reserved for the decision envelope.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();
    let hint = cli.command.map(HookCommand::hook_point);

    // The fail-open supervisor: no internal failure, error or panic, may
    // stop the host. Anything that goes wrong becomes a pass-through.
    let decision = match std::panic::catch_unwind(AssertUnwindSafe(|| run(hint))) {
        Ok(Ok(decision)) => decision,
        Ok(Err(err)) => {
            eprintln!("{STDERR_PREFIX} internal error, passing through: {err:#}");
            pass_through(hint)
        }
        Err(_) => {
            eprintln!("{STDERR_PREFIX} internal panic, passing through");
            pass_through(hint)
        }
    };

    if let Some(body) = decision.to_stdout_body() {
        println!("{body}");
    }
    // Implicit exit 0. A nonzero exit would be a verifier bug; the host
    // treats it as approve regardless.
}

/// The envelope emitted when the pipeline never ran: approve on pre-tool,
/// nothing on the observational hooks.
fn pass_through(hint: Option<HookPoint>) -> Decision {
    match hint {
        Some(HookPoint::PostTool) | Some(HookPoint::Stop) => Decision::Silent,
        _ => Decision::Approve,
    }
}

fn run(hint: Option<HookPoint>) -> Result<Decision> {
    let mut raw = String::new();
    std::io::stdin().read_to_string(&mut raw)?;

    let Some(event) = HookEvent::parse(&raw) else {
        // Empty or unparseable stdin: nothing to verify.
        return Ok(pass_through(hint));
    };
    let hook_point = event.hook_point.or(hint).unwrap_or(HookPoint::PreTool);

    let cwd = event
        .cwd
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    let project_root = qv_config::find_project_root(&cwd);
    let config = qv_config::resolve(&project_root);
    let session_id = qv_config::resolve_session_id(event.session_id.as_deref(), &project_root);
    let audit_dir = qv_config::audit_dir(&config, &project_root);

    let ctx = HookContext {
        event,
        config,
        project_root,
        session_id,
        audit_dir,
    };
    tracing::debug!(
        hook = %hook_point,
        session = %ctx.session_id,
        root = %ctx.project_root.display(),
        "dispatching"
    );

    match hook_point {
        HookPoint::PreTool => pre_tool::run(&ctx),
        HookPoint::PostTool => post_tool::run(&ctx),
        HookPoint::Stop => stop::run(&ctx),
    }
}
