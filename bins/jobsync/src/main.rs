use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use sched_core::cfg::{self, AppId, Backend, Config};
use sched_core::job::JobSpec;
use sched_core::remote::{HttpRequest, JobDefinition};
use sched_core::store::{self, DefaultKv, JobRecord};
use sched_core::transport::{LocalTransport, Transport};
use sched_core::{logx, map, validate, ReadOutcome, Reconciler};
use tracing::{debug, info, warn};

const APP: AppId = AppId {
    qualifier: "com",
    organization: "local",
    application: env!("CARGO_PKG_NAME"), // "jobsync"
};

/// Subscription used for addressing when the local backend has none configured.
const LOCAL_SUBSCRIPTION: &str = "local";

#[derive(Parser)]
#[command(name=env!("CARGO_PKG_NAME"), version, about="Declarative scheduler job sync")]
struct Cli {
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Override the backend from config.toml
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Local,
    Arm,
}

impl From<BackendArg> for Backend {
    fn from(b: BackendArg) -> Self {
        match b {
            BackendArg::Local => Backend::Local,
            BackendArg::Arm => Backend::Arm,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Check the job file without contacting the service
    Validate { file: PathBuf },
    /// Print the payload that apply would send (secrets redacted)
    Plan { file: PathBuf },
    /// Create or update the job and record what the service holds
    Apply { file: PathBuf },
    /// Re-read the job; forget it if the service no longer has it
    Refresh { file: PathBuf },
    /// Delete the job and forget it
    Destroy { file: PathBuf },
    /// Print the stored record for the job
    Show { file: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = cfg::load_or_init(&APP)?;
    logx::init(logx::level_for(cli.verbose, &cfg.log_level));
    if let Some(b) = cli.backend {
        cfg.backend = b.into();
    }
    debug!(backend = ?cfg.backend, "{} start", APP.application);

    match cli.cmd {
        Command::Validate { file } => {
            let spec = JobSpec::load(&file)?;
            if let Err(e) = validate::check(&spec) {
                bail!("{}: {e}", file.display());
            }
            println!("{}: ok", spec.address());
        }
        Command::Plan { file } => {
            let spec = JobSpec::load(&file)?;
            validate::check(&spec).with_context(|| format!("invalid job {}", file.display()))?;
            let mut payload = map::expand(&spec, &cfg.environment, Utc::now());
            redact(&mut payload);
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Command::Apply { file } => {
            let spec = JobSpec::load(&file)?;
            let (kv, rec) = session(&cfg)?;
            let observed = rec.apply(&spec)?;
            let record = JobRecord { id: observed.id, observed: observed.spec, synced_at: Utc::now() };
            store::save_record(&kv, &spec.address(), &record)?;
            info!(id = %record.id, "applied");
            println!("{}", record.id);
        }
        Command::Refresh { file } => {
            let spec = JobSpec::load(&file)?;
            let (kv, rec) = session(&cfg)?;
            let Some(mut record) = stored(&kv, &spec)? else {
                bail!("{} is not managed yet; run apply first", spec.address());
            };
            match rec.read(&record.id)? {
                ReadOutcome::Found(observed) => {
                    record.observed = observed.spec;
                    record.synced_at = Utc::now();
                    store::save_record(&kv, &spec.address(), &record)?;
                    println!("{}", record.id);
                }
                ReadOutcome::Gone => {
                    warn!(address = %spec.address(), "job is gone; dropping record");
                    store::forget_record(&kv, &spec.address());
                    println!("{}: gone", spec.address());
                }
            }
        }
        Command::Destroy { file } => {
            let spec = JobSpec::load(&file)?;
            let (kv, rec) = session(&cfg)?;
            match stored(&kv, &spec)? {
                Some(record) => {
                    rec.delete(&record.id)?;
                    store::forget_record(&kv, &spec.address());
                    println!("{}: destroyed", spec.address());
                }
                None => {
                    info!(address = %spec.address(), "nothing recorded; nothing to destroy");
                    println!("{}: absent", spec.address());
                }
            }
        }
        Command::Show { file } => {
            let spec = JobSpec::load(&file)?;
            let kv = open_store(&cfg)?;
            let Some(record) = stored(&kv, &spec)? else {
                bail!("no record for {}", spec.address());
            };
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }
    Ok(())
}

fn open_store(cfg: &Config) -> Result<DefaultKv> {
    store::open_default(cfg::state_dir(&APP, cfg)?)
}

fn stored(kv: &DefaultKv, spec: &JobSpec) -> Result<Option<JobRecord>> {
    store::load_record(kv, &spec.address())
}

fn session(cfg: &Config) -> Result<(DefaultKv, Reconciler<Box<dyn Transport>>)> {
    let kv = open_store(cfg)?;
    let (transport, subscription): (Box<dyn Transport>, &str) = match cfg.backend {
        Backend::Local => {
            let sub = match cfg.subscription_id.as_str() {
                "" => LOCAL_SUBSCRIPTION,
                s => s,
            };
            (Box::new(LocalTransport::new(kv.clone())) as Box<dyn Transport>, sub)
        }
        Backend::Arm => {
            if cfg.subscription_id.is_empty() {
                bail!("subscription_id is not set in {}", config_path()?.display());
            }
            (arm_transport(cfg)?, cfg.subscription_id.as_str())
        }
    };
    Ok((kv, Reconciler::new(transport, cfg.environment.clone(), subscription)))
}

fn config_path() -> Result<PathBuf> {
    Ok(cfg::config_dir(&APP)?.join("config.toml"))
}

#[cfg(feature = "arm-http")]
fn arm_transport(cfg: &Config) -> Result<Box<dyn Transport>> {
    let t = sched_core::transport::HttpTransport::from_env(&cfg.environment)?;
    Ok(Box::new(t))
}

#[cfg(not(feature = "arm-http"))]
fn arm_transport(_cfg: &Config) -> Result<Box<dyn Transport>> {
    bail!("built without the arm-http feature; use --backend local")
}

fn redact(def: &mut JobDefinition) {
    let Some(action) = def.properties.as_mut().and_then(|p| p.action.as_mut()) else {
        return;
    };
    redact_request(action.request.as_mut());
    redact_request(action.error_action.as_mut().and_then(|e| e.request.as_mut()));
}

fn redact_request(req: Option<&mut HttpRequest>) {
    if let Some(auth) = req.and_then(|r| r.authentication.as_mut()) {
        *auth = auth.without_secrets();
    }
}
