use std::path::PathBuf;

use tracing::info;

use batchline::{BatchComposer, ComposeConfig, read_prompts};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let usage = concat!(
        "usage: batchline-compose \\\n",
        "  --batch-id ID \\\n",
        "  --prompts PATH \\\n",
        "  [--config PATH] \\\n",
        "  [--model MODEL] [--reasoning-effort EFFORT] \\\n",
        "  [--system-prompt TEXT | --system-prompt-file PATH] \\\n",
        "  [--schema PATH] [--output-dir DIR] \\\n",
        "  [--preview INDEX] [--dry-run] [--json-logs]\n",
        "\n",
        "PATH for --prompts holds one {\"id\": ..., \"prompt\": ...} JSON object per\n",
        "line. The batch is written to DIR/batch_ID.jsonl; DIR must exist.\n",
    );

    let mut batch_id: Option<String> = None;
    let mut prompts_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut model: Option<String> = None;
    let mut reasoning_effort: Option<String> = None;
    let mut system_prompt: Option<String> = None;
    let mut system_prompt_file: Option<PathBuf> = None;
    let mut schema_file: Option<PathBuf> = None;
    let mut output_dir: Option<PathBuf> = None;
    let mut preview: Option<usize> = None;
    let mut dry_run = false;
    let mut json_logs = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--batch-id" => batch_id = Some(args.next().ok_or("missing value for --batch-id")?),
            "--prompts" => {
                prompts_path = Some(args.next().ok_or("missing value for --prompts")?.into())
            }
            "--config" => {
                config_path = Some(args.next().ok_or("missing value for --config")?.into())
            }
            "--model" => model = Some(args.next().ok_or("missing value for --model")?),
            "--reasoning-effort" => {
                reasoning_effort = Some(args.next().ok_or("missing value for --reasoning-effort")?)
            }
            "--system-prompt" => {
                system_prompt = Some(args.next().ok_or("missing value for --system-prompt")?)
            }
            "--system-prompt-file" => {
                system_prompt_file = Some(
                    args.next()
                        .ok_or("missing value for --system-prompt-file")?
                        .into(),
                )
            }
            "--schema" => schema_file = Some(args.next().ok_or("missing value for --schema")?.into()),
            "--output-dir" => {
                output_dir = Some(args.next().ok_or("missing value for --output-dir")?.into())
            }
            "--preview" => {
                preview = Some(args.next().ok_or("missing value for --preview")?.parse()?)
            }
            "--dry-run" => dry_run = true,
            "--json-logs" => json_logs = true,
            "--help" | "-h" => {
                println!("{usage}");
                return Ok(());
            }
            other => return Err(format!("unknown arg: {other}").into()),
        }
    }

    if system_prompt.is_some() && system_prompt_file.is_some() {
        return Err("cannot use --system-prompt together with --system-prompt-file".into());
    }

    init_tracing(json_logs)?;

    let batch_id = batch_id.ok_or(usage)?;
    let prompts_path = prompts_path.ok_or(usage)?;

    let mut config = match config_path.as_ref() {
        Some(path) => ComposeConfig::load(path)?,
        None => ComposeConfig::default(),
    };
    if model.is_some() {
        config.model = model;
    }
    if reasoning_effort.is_some() {
        config.reasoning_effort = reasoning_effort;
    }
    if system_prompt.is_some() {
        config.system_prompt = system_prompt;
        config.system_prompt_file = None;
    } else if system_prompt_file.is_some() {
        config.system_prompt_file = system_prompt_file;
        config.system_prompt = None;
    }
    if schema_file.is_some() {
        config.schema_file = schema_file;
    }
    if output_dir.is_some() {
        config.output_dir = output_dir;
    }

    let mut composer = BatchComposer::from_config(&config)?;

    let records = read_prompts(&prompts_path)?;
    for record in records {
        composer.add_entry(record.id, record.prompt);
    }
    info!(
        entries = composer.entry_count(),
        model = composer.model(),
        "prepared batch {}",
        batch_id
    );

    if let Some(index) = preview {
        let entry = composer.preview_entry(index)?;
        println!("{}", serde_json::to_string_pretty(entry)?);
    }

    if dry_run {
        info!("dry run, skipping write");
        return Ok(());
    }

    composer.save_to_file(&batch_id)?;
    Ok(())
}

fn init_tracing(json_logs: bool) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::Layer as _;
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let fmt_layer = if json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;
    Ok(())
}
