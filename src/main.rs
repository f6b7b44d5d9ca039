use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docfill::DocfillError;
use docfill::app::{App, TemplateState};
use docfill::config::Config;
use docfill::form::{Form, Submission, parse_assignment};
use docfill::store::FsTemplateStore;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docfill")]
#[command(about = "Fill {{placeholder}} document templates and render them to PDF")]
struct Cli {
    #[arg(long, global = true, help = "JSON configuration file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, env = "DOCFILL_WORK_DIR", help = "Directory holding the active template")]
    work_dir: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        env = "DOCFILL_ADMIN_SECRET",
        hide_env_values = true,
        help = "Shared admin secret"
    )]
    admin_secret: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Upload a DOCX or text template (admin)")]
    Upload {
        #[arg(help = "Template file")]
        file: PathBuf,
        #[arg(long, env = "DOCFILL_PASSWORD", hide_env_values = true, help = "Admin password")]
        password: String,
    },
    #[command(about = "Write the active template's raw bytes (admin)")]
    DownloadTemplate {
        #[arg(help = "Output file")]
        output: PathBuf,
        #[arg(long, env = "DOCFILL_PASSWORD", hide_env_values = true, help = "Admin password")]
        password: String,
    },
    #[command(about = "Show whether a template is active")]
    Status,
    #[command(about = "Show the form fields of the active template")]
    Fields {
        #[arg(long, help = "Print the form as JSON")]
        json: bool,
    },
    #[command(about = "Print the filled template text without rendering a PDF")]
    Preview {
        #[arg(long = "set", value_parser = parse_assignment, help = "Field value as NAME=VALUE (repeatable)")]
        set: Vec<(String, String)>,
        #[arg(long, help = "JSON file with an object of field values")]
        values: Option<PathBuf>,
    },
    #[command(about = "Fill the active template and render it to PDF")]
    Generate {
        #[arg(long = "set", value_parser = parse_assignment, help = "Field value as NAME=VALUE (repeatable)")]
        set: Vec<(String, String)>,
        #[arg(long, help = "JSON file with an object of field values")]
        values: Option<PathBuf>,
        #[arg(long, help = "Output name; the PDF is saved as <NAME>.pdf")]
        name: Option<String>,
        #[arg(short, long, help = "Prompt for every field on the terminal")]
        interactive: bool,
        #[arg(long, default_value = ".", help = "Directory for the generated PDF")]
        out_dir: PathBuf,
        #[arg(long, conflicts_with = "out_dir", help = "Write the PDF to stdout")]
        stdout: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<DocfillError>() {
                Some(err) => {
                    tracing::debug!(error = %err, "request failed");
                    eprintln!("Error: {}", err.user_message());
                }
                None => eprintln!("Error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(dir) = &cli.work_dir {
        config.work_dir = dir.clone();
    }
    if let Some(secret) = &cli.admin_secret {
        config.admin_secret = Some(secret.clone());
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let app = App::from_config(&config);

    match cli.command {
        Commands::Upload { file, password } => {
            let admin = app.admin(&password)?;
            let bytes = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let fields = admin.upload(&bytes)?;
            println!("Template uploaded successfully!");
            print_detected_fields(&fields);
        }
        Commands::DownloadTemplate { output, password } => {
            let bytes = app.admin(&password)?.template_bytes()?;
            std::fs::write(&output, &bytes)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("Template saved to {} ({} bytes)", output.display(), bytes.len());
        }
        Commands::Status => match app.state() {
            TemplateState::NoTemplate => println!("NoTemplate"),
            TemplateState::TemplateActive => println!("TemplateActive"),
        },
        Commands::Fields { json } => {
            let form = app.form()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&form)?);
            } else {
                print_form(&form);
            }
        }
        Commands::Preview { set, values } => {
            let values = collect_values(values, set)?;
            print!("{}", app.preview(&values)?);
            std::io::stdout().flush()?;
        }
        Commands::Generate {
            set,
            values,
            name,
            interactive,
            out_dir,
            stdout,
        } => {
            let mut submission = Submission {
                values: collect_values(values, set)?,
                output_name: name,
            };
            if interactive {
                prompt_form(&app, &mut submission)?;
            }

            let doc = app.generate(&submission)?;
            if stdout {
                doc.deliver(&mut std::io::stdout().lock())?;
            } else {
                let path = doc.deliver_to_dir(&out_dir)?;
                println!("PDF Generated Successfully!");
                println!("{} ({}, {} pages)", path.display(), doc.mime_type(), doc.page_count);
            }
        }
    }
    Ok(())
}

fn print_detected_fields(fields: &[String]) {
    println!("Detected Fields:");
    if fields.is_empty() {
        println!("  (none)");
    }
    for field in fields {
        println!("  {}", field);
    }
}

fn print_form(form: &Form) {
    if form.is_empty() {
        println!("No fields to fill.");
    }
    for field in &form.fields {
        println!("{}", field);
    }
    println!("{} (required)", form.output_name_label);
}

/// Values from `--values` first, then `--set` pairs on top
fn collect_values(file: Option<PathBuf>, set: Vec<(String, String)>) -> Result<BTreeMap<String, String>> {
    let mut values: BTreeMap<String, String> = match file {
        Some(path) => {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("{} must hold a JSON object of strings", path.display()))?
        }
        None => BTreeMap::new(),
    };
    values.extend(set);
    Ok(values)
}

/// Ask for each field of the current form on stdin; Enter keeps a value given on the command line
fn prompt_form(app: &App<FsTemplateStore>, submission: &mut Submission) -> Result<()> {
    let form = app.form()?;
    if form.is_empty() {
        eprintln!("No fields to fill.");
    }

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    let mut ask = |label: &str, current: Option<&String>| -> Result<Option<String>> {
        match current {
            Some(v) => eprint!("{} [{}]: ", label, v),
            None => eprint!("{}: ", label),
        }
        std::io::stderr().flush()?;
        let answer = lines.next().transpose()?.unwrap_or_default();
        Ok(if answer.is_empty() { None } else { Some(answer) })
    };

    for field in &form.fields {
        if let Some(answer) = ask(field, submission.values.get(field))? {
            submission.values.insert(field.clone(), answer);
        }
    }
    if let Some(answer) = ask(&form.output_name_label, submission.output_name.as_ref())? {
        submission.output_name = Some(answer);
    }
    Ok(())
}
