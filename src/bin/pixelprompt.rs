//! CLI binary for pixelprompt.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `GenerationConfig`, prints a terminal preview of each grid, and optionally
//! writes JSON or a PNG.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pixelprompt::export::parse_hex_rgb;
use pixelprompt::{
    generate_batch, generate_pixels_from_prompt, process_response, write_png, GenerationConfig,
    GenerationOutput, GenerationProgressCallback, PixelGrid, ProgressCallback,
};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Batch progress: one bar, one log line per finished prompt. Prompts may
/// finish out of order.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:32.green/238}] {pos:>2}/{len} prompts  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Drawing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn on_prompt_complete(&self, index: usize, total: usize, pixel_count: usize) {
        self.bar.println(format!(
            "  {} Prompt {:>2}/{:<2}  {}",
            green("✓"),
            index + 1,
            total,
            dim(&format!("{pixel_count:>3} pixels")),
        ));
        self.bar.inc(1);
    }

    fn on_prompt_error(&self, index: usize, total: usize, error: &str) {
        let msg = match error.char_indices().nth(79) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };
        self.bar.println(format!(
            "  {} Prompt {:>2}/{:<2}  {}",
            red("✗"),
            index + 1,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total.saturating_sub(success_count);
        if failed == 0 {
            eprintln!("{} {} prompts drawn", green("✔"), bold(&success_count.to_string()));
        } else {
            eprintln!(
                "{} {}/{} prompts drawn  ({} failed)",
                if failed == total { red("✘") } else { yellow("⚠") },
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Draw one prompt, preview in the terminal
  pixelprompt "a yellow duck"

  # Save a 512x512 PNG (32 px per cell)
  pixelprompt "red mushroom" --png mushroom.png --scale 32

  # Several prompts, 4 at a time, JSON output
  pixelprompt "tree" "house" "cat" "sun" --json > art.json

  # Run the parser on a saved model answer (no API key needed)
  pixelprompt --from-response answer.txt
  cat answer.txt | pixelprompt --from-response -

  # Use a specific model
  pixelprompt --provider anthropic --model claude-sonnet-4-20250514 "spaceship"

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Provider used when --provider is not given
  EDGEQUAKE_MODEL         Model used with EDGEQUAKE_LLM_PROVIDER
  PIXELPROMPT_*           Every flag above, e.g. PIXELPROMPT_MODEL, PIXELPROMPT_SCALE
  RUST_LOG                Log filter (e.g. pixelprompt=debug)
"#;

/// Draw 16x16 pixel art from text prompts with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "pixelprompt",
    version,
    about = "Draw 16x16 pixel art from text prompts with an LLM",
    long_about = "Ask a language model for 16x16 pixel art and turn its free-form answer into a \
validated grid. Fenced, chatty, truncated or slightly broken JSON is recovered; white pixels and \
malformed records are dropped; coordinates are clamped onto the canvas.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// What to draw. Several prompts run as a concurrent batch.
    #[arg(required_unless_present = "from_response")]
    prompts: Vec<String>,

    /// Skip the model: parse a saved model answer from FILE ('-' for stdin).
    #[arg(long, env = "PIXELPROMPT_FROM_RESPONSE", value_name = "FILE", conflicts_with = "prompts")]
    from_response: Option<String>,

    /// LLM model ID (e.g. gpt-4.1-mini, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, env = "PIXELPROMPT_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "PIXELPROMPT_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PIXELPROMPT_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Max LLM output tokens per prompt.
    #[arg(long, env = "PIXELPROMPT_MAX_TOKENS", default_value_t = 2000)]
    max_tokens: usize,

    /// Retries per prompt on LLM failure.
    #[arg(long, env = "PIXELPROMPT_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Per-call LLM timeout in seconds.
    #[arg(long, env = "PIXELPROMPT_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "PIXELPROMPT_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Warn when fewer pixels than this survive sanitization.
    #[arg(long, env = "PIXELPROMPT_MIN_PIXELS", default_value_t = 10)]
    min_pixels: usize,

    /// Prompts generated at the same time in batch mode.
    #[arg(short, long, env = "PIXELPROMPT_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Write the grid as a PNG (single prompt only).
    #[arg(long, env = "PIXELPROMPT_PNG")]
    png: Option<PathBuf>,

    /// PNG pixels per grid cell.
    #[arg(long, env = "PIXELPROMPT_SCALE", default_value_t = 16,
          value_parser = clap::value_parser!(u32).range(1..=256))]
    scale: u32,

    /// Output structured JSON instead of a terminal preview.
    #[arg(long, env = "PIXELPROMPT_JSON")]
    json: bool,

    /// Disable spinner and progress bar.
    #[arg(long, env = "PIXELPROMPT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PIXELPROMPT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, env = "PIXELPROMPT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if cli.png.is_some() && cli.prompts.len() > 1 {
        anyhow::bail!("--png takes a single prompt (got {})", cli.prompts.len());
    }

    // ── Offline mode ─────────────────────────────────────────────────────
    if let Some(ref source) = cli.from_response {
        let raw = read_response(source).await?;
        let config = build_config(&cli, None).await?;
        let output = process_response(&raw, &config).context("Could not extract pixel art")?;
        return emit_single(&cli, "(saved response)", &output);
    }

    // ── Single prompt ────────────────────────────────────────────────────
    if cli.prompts.len() == 1 {
        let prompt = &cli.prompts[0];
        let config = build_config(&cli, None).await?;

        let spinner = show_progress.then(|| spinner(prompt));
        let result = generate_pixels_from_prompt(prompt, &config).await;
        if let Some(bar) = spinner {
            bar.finish_and_clear();
        }
        let output = result.context("Generation failed")?;
        return emit_single(&cli, prompt, &output);
    }

    // ── Batch ────────────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn GenerationProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;
    let items = generate_batch(&cli.prompts, &config).await;

    if cli.json {
        let entries: Vec<serde_json::Value> = items
            .iter()
            .map(|item| match &item.result {
                Ok(output) => serde_json::json!({ "prompt": item.prompt, "output": output }),
                Err(e) => serde_json::json!({
                    "prompt": item.prompt,
                    "error": e.to_string(),
                    "kind": e.kind(),
                }),
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).context("Failed to serialise output")?
        );
    } else {
        for item in &items {
            match &item.result {
                Ok(output) => print_preview(&item.prompt, output, cli.quiet),
                Err(e) => eprintln!("{} {}: {}", red("✗"), bold(&item.prompt), e),
            }
        }
    }

    let failed = items.iter().filter(|item| item.result.is_err()).count();
    if failed == items.len() {
        anyhow::bail!("All {} prompts failed", failed);
    }
    Ok(())
}

/// Print or save the result of a single generation.
fn emit_single(cli: &Cli, label: &str, output: &GenerationOutput) -> Result<()> {
    if let Some(ref path) = cli.png {
        write_png(&output.grid, cli.scale, path)
            .with_context(|| format!("Failed to write PNG to {}", path.display()))?;
        if !cli.quiet {
            eprintln!("{} wrote {}", green("✔"), bold(&path.display().to_string()));
        }
    }

    if cli.json {
        let json = serde_json::to_string_pretty(output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        print_preview(label, output, cli.quiet);
    }
    Ok(())
}

fn print_preview(label: &str, output: &GenerationOutput, quiet: bool) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if !quiet {
        writeln!(handle, "{}", bold(label)).ok();
    }
    handle.write_all(render_ansi(&output.grid).as_bytes()).ok();

    if !quiet {
        let s = &output.stats;
        eprintln!(
            "   {} pixels  /  {} candidates, {} dropped, {} overwritten  {}",
            s.pixels,
            s.candidates,
            s.dropped,
            s.overwritten,
            dim(&format!(
                "via {}{}",
                s.strategy.map(|st| st.name()).unwrap_or("-"),
                if s.repaired { " (repaired)" } else { "" }
            )),
        );
    }
    if let Some(ref warning) = output.warning {
        eprintln!("{} {}", yellow("⚠"), warning);
    }
}

/// Two terminal columns per cell, 24-bit background colors.
fn render_ansi(grid: &PixelGrid) -> String {
    let mut out = String::new();
    for row in grid.rows() {
        for cell in row {
            let [r, g, b] = cell
                .as_deref()
                .and_then(parse_hex_rgb)
                .unwrap_or([0xFF, 0xFF, 0xFF]);
            out.push_str(&format!("\x1b[48;2;{r};{g};{b}m  "));
        }
        out.push_str("\x1b[0m\n");
    }
    out
}

fn spinner(prompt: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS),
    );
    bar.set_prefix("Drawing");
    bar.set_message(prompt.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

async fn read_response(source: &str) -> Result<String> {
    if source == "-" {
        let mut raw = String::new();
        io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read model response from stdin")?;
        return Ok(raw);
    }
    tokio::fs::read_to_string(source)
        .await
        .with_context(|| format!("Failed to read model response from {:?}", source))
}

/// Map CLI args to `GenerationConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout)
        .min_pixels(cli.min_pixels)
        .concurrency(cli.concurrency);

    if let Some(ref path) = cli.system_prompt {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(text);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
