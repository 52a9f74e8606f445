use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use featurewiz::app::run_tui;
use featurewiz::config::Config;
use featurewiz::logging;
use featurewiz::onboarding::run_setup;
use featurewiz::session::{
    firestore::FirestoreOptions, FieldValue, Fields, FirestoreStore, MemoryStore, SessionContext,
    SessionField, SessionStore,
};
use featurewiz::suggest::SuggestionClient;
use featurewiz::ui::App;
use featurewiz::waitlist::PredictionForm;
use featurewiz::wizard::{Destination, RequestState, StepController, SuggestionStep, WizardFlow};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "featurewiz",
    about = "Define a product feature step by step, with ML suggestions along the way",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Keep documents in a local file instead of Firestore
    #[arg(long, global = true)]
    offline: bool,

    /// Session id of an existing run (needs --document)
    #[arg(long, requires = "document")]
    session: Option<String>,

    /// Document id of an existing run (needs --session)
    #[arg(long, requires = "session")]
    document: Option<String>,

    /// Continue the most recent run
    #[arg(long, conflicts_with = "session")]
    resume: bool,

    /// Page to open on (data-elements, hypothesis, marketing, feature-name, summary)
    #[arg(long, value_parser = parse_destination)]
    start: Option<Destination>,

    #[command(flatten)]
    intake: IntakeArgs,
}

/// Fields earlier pages would have collected
#[derive(Args, Debug, Default, Clone)]
struct IntakeArgs {
    #[arg(long)]
    problem: Option<String>,
    #[arg(long)]
    acceptance: Option<String>,
    #[arg(long)]
    customer: Option<String>,
    #[arg(long)]
    market: Option<String>,
    #[arg(long)]
    hypothesis: Option<String>,
}

impl IntakeArgs {
    fn into_fields(self) -> Fields {
        [
            (SessionField::FinalProblemStatement, self.problem),
            (SessionField::AcceptanceCriteria, self.acceptance),
            (SessionField::TargetCustomer, self.customer),
            (SessionField::MarketSize, self.market),
            (SessionField::Hypothesis, self.hypothesis),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field.key().to_string(), FieldValue::Text(v))))
        .collect()
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a session record and print its ids
    Start {
        #[command(flatten)]
        intake: IntakeArgs,
    },
    /// Print suggestions for one step of an existing session
    Generate {
        #[arg(value_parser = parse_step)]
        step: SuggestionStep,
        #[arg(long)]
        session: String,
    },
    /// Predict a salary from age and weight
    Predict {
        #[arg(long)]
        age: String,
        #[arg(long)]
        weight: String,
        /// Also join the waitlist with this address
        #[arg(long)]
        email: Option<String>,
    },
    /// Add an email address to the waitlist
    Waitlist {
        #[arg(long)]
        email: String,
    },
    /// Store Firestore credentials in the system keychain
    Setup,
}

fn parse_destination(name: &str) -> Result<Destination, String> {
    Destination::from_name(name).ok_or_else(|| format!("unknown page '{}'", name))
}

fn parse_step(name: &str) -> Result<SuggestionStep, String> {
    SuggestionStep::from_name(name).ok_or_else(|| {
        format!(
            "unknown step '{}' (expected data-elements, marketing or feature-name)",
            name
        )
    })
}

/// Pick the document backend and a label for the header
fn open_store(config: &Config, offline: bool) -> Result<(SessionStore, String)> {
    if offline || config.offline {
        let store = match Config::offline_store_path() {
            Some(path) => {
                let store = MemoryStore::with_file(&path)
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                info!(path = %path.display(), "using offline store");
                SessionStore::new(Arc::new(store))
            }
            None => {
                warn!("no data directory; offline documents will not survive this run");
                SessionStore::in_memory()
            }
        };
        return Ok((store, "offline".to_string()));
    }

    let Some(project) = config.firestore_project() else {
        bail!("No Firestore project configured. Run `featurewiz setup` or pass --offline.");
    };
    let creds = config.credentials();
    let mut options = FirestoreOptions::new(&project);
    options.api_key = creds.firestore_api_key;
    options.id_token = creds.id_token;
    options.timeout = Duration::from_secs(config.request_timeout_secs);
    let store = FirestoreStore::new(options).context("Failed to set up Firestore client")?;
    Ok((SessionStore::new(Arc::new(store)), format!("firestore:{}", project)))
}

async fn run_wizard(cli: Cli, mut config: Config) -> Result<()> {
    let (store, store_label) = open_store(&config, cli.offline)?;
    let client = SuggestionClient::from_config(&config)?;
    let auth = config.auth_state();

    let (ctx, resumed) = match (cli.session, cli.document) {
        (Some(session), Some(document)) => (SessionContext::new(session, document, auth), true),
        _ if cli.resume => match config.last_session.clone() {
            Some(mut last) => {
                last.auth = auth;
                (last, true)
            }
            None => bail!("No previous run to resume"),
        },
        _ => (SessionContext::generate(auth), false),
    };

    let mut flow = WizardFlow::new(ctx.clone(), Destination::FIRST);
    if resumed {
        store
            .ensure_record(&ctx)
            .await
            .context("Couldn't find that session")?;
        flow.resume(&store)
            .await
            .context("Couldn't load saved progress")?;
        let intake = cli.intake.into_fields();
        if !intake.is_empty() {
            store.merge_fields(&ctx.session_record(), intake).await?;
        }
    } else {
        store
            .create_record(&ctx, cli.intake.into_fields())
            .await
            .context("Couldn't create the session record")?;
    }
    let start = cli.start.unwrap_or_else(|| {
        if resumed {
            flow.first_incomplete()
        } else {
            Destination::FIRST
        }
    });
    flow.start_at(start);

    config.last_session = Some(ctx.clone());
    if let Err(err) = config.save() {
        warn!(error = %err, "couldn't remember this run for --resume");
    }

    let app = run_tui(App::new(flow, store_label), store, client).await?;
    info!(route = app.current().route(), "wizard closed");
    eprintln!(
        "  Session {} saved. Continue with: featurewiz --resume",
        ctx.session_id
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.command.is_none() {
        logging::init_for_tui(Config::log_path().as_deref())?;
    } else {
        logging::init_for_cli();
    }
    let mut config = Config::load();

    let Some(command) = cli.command else {
        return run_wizard(cli, config).await;
    };
    let offline = cli.offline;

    match command {
        Command::Setup => run_setup(&mut config).map_err(anyhow::Error::msg),
        Command::Start { intake } => {
            let (store, _) = open_store(&config, offline)?;
            let ctx = SessionContext::generate(config.auth_state());
            let path = store.create_record(&ctx, intake.into_fields()).await?;
            println!("session  {}", ctx.session_id);
            println!("document {}", ctx.document_id);
            println!("record   {}", path);
            config.last_session = Some(ctx);
            config.save()?;
            Ok(())
        }
        Command::Generate { step, session } => {
            let (store, _) = open_store(&config, offline)?;
            let client = SuggestionClient::from_config(&config)?;
            let mut controller = StepController::new(step);
            let state = controller.generate(&session, &store, &client).await?.clone();
            match state {
                RequestState::Loaded(items) => {
                    for (i, item) in items.iter().enumerate() {
                        println!("{:>2}. {}", i + 1, controller.display(&item.raw));
                    }
                    Ok(())
                }
                RequestState::Error(message) => bail!("{}", message),
                RequestState::Idle | RequestState::Loading { .. } => {
                    bail!("Request finished without a result")
                }
            }
        }
        Command::Predict { age, weight, email } => {
            let (store, _) = open_store(&config, offline)?;
            let client = SuggestionClient::from_config(&config)?;
            let mut form = PredictionForm::default();
            form.age = age;
            form.weight = weight;
            form.email = email.unwrap_or_default();
            match form.submit(&client, &store).await {
                Some(prediction) => {
                    println!("The predicted salary is: {} each year", prediction);
                    if let Some(message) = form.waitlist_message() {
                        println!("{}", message);
                    }
                    Ok(())
                }
                None => bail!("{}", form.error().unwrap_or("Prediction failed")),
            }
        }
        Command::Waitlist { email } => {
            let (store, _) = open_store(&config, offline)?;
            let mut form = PredictionForm::default();
            form.email = email.clone();
            if !form.join(&store).await {
                bail!("Couldn't add {} to the waitlist (see the log above)", email);
            }
            if let Some(message) = form.waitlist_message() {
                println!("{}", message);
            }
            Ok(())
        }
    }
}
