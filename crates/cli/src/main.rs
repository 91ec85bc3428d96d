use chrono::Utc;
use clap::{Parser, Subcommand};
use serolab_core::client::Credentials;
use serolab_core::{
    display_label, filter_patients, parse_scanned_id, results_path, workflows::failures, Catalog,
    CoreConfig, Demographics, Descriptor, HttpLabApi, LabApi, LabError, PatientEdit, PatientId,
    PatientReport, RegistrationSession, ResultInput, ResultsEntry, StoredSession,
    SubmissionOutcome, TestPath, TokenStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "serolab")]
#[command(about = "Serology lab registration and results CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Descriptor fields given on the command line; absent flags leave a field unchanged.
#[derive(clap::Args, Default)]
struct DescriptorArgs {
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    sub_category: Option<String>,
    #[arg(long)]
    name: Option<String>,
    /// Test type, e.g. the isotype; an empty value removes it
    #[arg(long = "type")]
    test_type: Option<String>,
    #[arg(long)]
    normal_range: Option<String>,
}

impl DescriptorArgs {
    fn apply(self, d: &mut Descriptor) {
        let fields = [
            (self.category, &mut d.category),
            (self.sub_category, &mut d.sub_category),
            (self.name, &mut d.name),
            (self.test_type, &mut d.test_type),
            (self.normal_range, &mut d.normal_range),
        ];
        for (value, field) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a stored analysis name
    Decode {
        /// Encoded descriptor, e.g. "[CAT]elisaTests[SUB]hepatitisMarkers[NAME]HBsAg[RANGE]Negative"
        raw: String,
    },
    /// Encode descriptor fields into an analysis name
    Encode {
        #[command(flatten)]
        fields: DescriptorArgs,
    },
    /// Show the test catalog and the path of every test
    Catalog {
        /// Print the catalog as YAML (suitable for SEROLAB_CATALOG_FILE)
        #[arg(long)]
        yaml: bool,
    },
    /// Log in and store the session token
    Login { email: String, password: String },
    /// Forget the stored session token
    Logout,
    /// Register another admin account
    Admin { email: String, password: String },
    /// List patients
    List {
        /// Only patients whose unique number or name contains this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Register a patient with a selection of tests
    Register {
        health_care_no: String,
        name: String,
        age: String,
        /// M or F
        sex: String,
        /// Test path from `serolab catalog`; repeat for several tests
        #[arg(long = "test", required = true)]
        tests: Vec<String>,
    },
    /// Show the analyses awaiting results for a patient
    Results { patient_id: PatientId },
    /// Enter results as ANALYSIS_ID=RESULT pairs
    SaveResults {
        patient_id: PatientId,
        #[arg(required = true)]
        results: Vec<String>,
    },
    /// Print a patient's report
    Report { patient_id: PatientId },
    /// Resolve scanned barcode text or a typed id
    Scan { input: String },
    /// Change the descriptor of one analysis
    EditAnalysis {
        patient_id: PatientId,
        analysis_id: i64,
        #[command(flatten)]
        fields: DescriptorArgs,
    },
    /// Add an analysis to a registered patient
    AddAnalysis {
        patient_id: PatientId,
        #[command(flatten)]
        fields: DescriptorArgs,
    },
    /// Remove an analysis from a registered patient
    RemoveAnalysis {
        patient_id: PatientId,
        analysis_id: i64,
    },
    /// Delete a patient
    Delete { patient_id: PatientId },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("serolab_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = CoreConfig::from_lookup(|key| std::env::var(key).ok())?;
    let store = TokenStore::new(cfg.token_file());

    let Some(command) = cli.command else {
        println!("Use 'serolab --help' for commands");
        return Ok(());
    };

    match run(command, &cfg, &store).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if let Some(lab) = e.downcast_ref::<LabError>() {
                if lab.requires_login() {
                    store.logout()?;
                    eprintln!("Session is not valid; run 'serolab login' first.");
                }
            }
            Err(e)
        }
    }
}

/// Client authenticated with the stored session.
fn session_api(cfg: &CoreConfig, store: &TokenStore) -> anyhow::Result<HttpLabApi> {
    let session = store.current(Utc::now())?;
    tracing::debug!("using session stored at {}", store.path().display());
    Ok(HttpLabApi::new(cfg)?.with_token(session.token))
}

fn print_outcomes(outcomes: &[SubmissionOutcome]) {
    for outcome in outcomes {
        match &outcome.error {
            None => println!("  ok      {}", outcome.label),
            Some(error) => println!("  FAILED  {} ({error})", outcome.label),
        }
    }
}

async fn run(command: Commands, cfg: &CoreConfig, store: &TokenStore) -> anyhow::Result<()> {
    match command {
        Commands::Decode { raw } => {
            let d = Descriptor::decode(&raw);
            println!("category:     {}", d.category);
            println!("sub-category: {}", d.sub_category);
            println!("name:         {}", d.name);
            println!("type:         {}", d.test_type);
            println!("normal range: {}", d.normal_range);
        }
        Commands::Encode { fields } => {
            let mut d = Descriptor::default();
            fields.apply(&mut d);
            d.validate_editable()?;
            println!("{}", d.encode());
        }
        Commands::Catalog { yaml } => {
            let catalog: Catalog = cfg.load_catalog()?;
            if yaml {
                print!("{}", catalog.to_yaml()?);
                return Ok(());
            }
            let mut current: Option<(String, String)> = None;
            for path in catalog.leaf_paths() {
                let heading = (path.category.clone(), path.sub_category.clone());
                if current.as_ref() != Some(&heading) {
                    println!(
                        "\n{} / {}",
                        display_label(&path.category),
                        display_label(&path.sub_category)
                    );
                    current = Some(heading);
                }
                if let Some(leaf) = catalog.leaf(&path) {
                    println!("  {:<60} {} ({})", path.to_string(), leaf.name, leaf.normal_range);
                }
            }
        }
        Commands::Login { email, password } => {
            let api = HttpLabApi::new(cfg)?;
            let res = api.login(&Credentials { email, password }).await?;
            store.login(&StoredSession {
                token: res.token,
                role: res.role,
            })?;
            println!("Logged in; session saved to {}", store.path().display());
        }
        Commands::Logout => {
            store.logout()?;
            println!("Logged out");
        }
        Commands::Admin { email, password } => {
            let api = session_api(cfg, store)?;
            api.register_admin(&Credentials {
                email: email.clone(),
                password,
            })
            .await?;
            println!("Registered admin {email}");
        }
        Commands::List { search } => {
            let api = session_api(cfg, store)?;
            let all = api.list_patients().await?;
            let patients = filter_patients(&all, search.as_deref().unwrap_or_default());
            if patients.is_empty() {
                println!("No patients found.");
            }
            for p in patients {
                println!(
                    "ID: {}, No: {}, Name: {}, Age: {}, Gender: {}, Analyses: {}",
                    p.id,
                    p.unique_number,
                    p.name,
                    p.age,
                    p.gender,
                    p.pathology_analyses.len()
                );
            }
        }
        Commands::Register {
            health_care_no,
            name,
            age,
            sex,
            tests,
        } => {
            let demographics = Demographics::parse(&health_care_no, &name, &age, &sex)?;
            let template = cfg.load_catalog()?;
            let mut session = RegistrationSession::new(&template);
            for raw in &tests {
                let path: TestPath = raw.parse()?;
                if !session.catalog().is_selected(&path) && !session.toggle(&path) {
                    anyhow::bail!("unknown test '{raw}'; see 'serolab catalog'");
                }
            }

            let api = session_api(cfg, store)?;
            let receipt = session
                .submit(&api, &demographics, cfg.results_origin())
                .await?;
            println!("Registered patient {}", receipt.patient_id);
            println!("Barcode: {}", receipt.results_url);
            print_outcomes(&receipt.outcomes);
            if !receipt.is_complete() {
                anyhow::bail!(
                    "{} analyses were not saved; add them with 'serolab add-analysis'",
                    failures(&receipt.outcomes).len()
                );
            }
        }
        Commands::Results { patient_id } => {
            let api = session_api(cfg, store)?;
            let entry = ResultsEntry::load(&api, patient_id).await?;
            println!("Results for {} ({})", entry.patient_name, entry.patient_id);
            for a in &entry.analyses {
                println!(
                    "  {:>6}  {:<40} {:<16} ({})",
                    a.id,
                    a.label(),
                    a.result.as_deref().unwrap_or("-"),
                    a.descriptor.normal_range
                );
            }
        }
        Commands::SaveResults {
            patient_id,
            results,
        } => {
            let entered = results
                .iter()
                .map(|pair| {
                    let (id, result) = pair
                        .split_once('=')
                        .ok_or_else(|| anyhow::anyhow!("expected ANALYSIS_ID=RESULT, got '{pair}'"))?;
                    Ok(ResultInput {
                        analysis_id: id.trim().parse()?,
                        result: result.to_string(),
                    })
                })
                .collect::<anyhow::Result<Vec<_>>>()?;

            let api = session_api(cfg, store)?;
            let entry = ResultsEntry::load(&api, patient_id).await?;
            let outcomes = entry.save(&api, &entered).await?;
            print_outcomes(&outcomes);
            if !failures(&outcomes).is_empty() {
                anyhow::bail!("some results were not saved");
            }
        }
        Commands::Report { patient_id } => {
            let api = session_api(cfg, store)?;
            let record = api.get_patient(patient_id).await?;
            print!("{}", PatientReport::from_record(&record).render_text());
        }
        Commands::Scan { input } => {
            let id = parse_scanned_id(&input)?;
            println!("Patient {id}: {}", results_path(id));
        }
        Commands::EditAnalysis {
            patient_id,
            analysis_id,
            fields,
        } => {
            let api = session_api(cfg, store)?;
            let mut edit = PatientEdit::from_record(&api.get_patient(patient_id).await?);
            let index = edit
                .analyses
                .iter()
                .position(|a| a.id == analysis_id)
                .ok_or_else(|| anyhow::anyhow!("patient {patient_id} has no analysis {analysis_id}"))?;
            if let Some(row) = edit.analysis_mut(index) {
                fields.apply(&mut row.descriptor);
            }
            edit.save(&api).await?;
            println!("Updated analysis {analysis_id}");
        }
        Commands::AddAnalysis { patient_id, fields } => {
            let api = session_api(cfg, store)?;
            let mut edit = PatientEdit::from_record(&api.get_patient(patient_id).await?);
            let index = edit.add_blank();
            if let Some(row) = edit.analysis_mut(index) {
                fields.apply(&mut row.descriptor);
            }
            edit.save(&api).await?;
            println!("Added analysis to patient {patient_id}");
        }
        Commands::RemoveAnalysis {
            patient_id,
            analysis_id,
        } => {
            let api = session_api(cfg, store)?;
            let mut edit = PatientEdit::from_record(&api.get_patient(patient_id).await?);
            let index = edit
                .analyses
                .iter()
                .position(|a| a.id == analysis_id)
                .ok_or_else(|| anyhow::anyhow!("patient {patient_id} has no analysis {analysis_id}"))?;
            edit.remove(index);
            edit.save(&api).await?;
            println!("Removed analysis {analysis_id}");
        }
        Commands::Delete { patient_id } => {
            let api = session_api(cfg, store)?;
            api.delete_patient(patient_id).await?;
            println!("Deleted patient {patient_id}");
        }
    }

    Ok(())
}
