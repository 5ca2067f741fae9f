//! GIF to text-art CLI
//!
//! Renders every frame of an animated GIF as ASCII density glyphs or as
//! coloured block glyphs and embeds the frames in an HTML page built from a
//! jinja template.
//!
//! Run with: `gif2txt input.gif -m 60 -o out.html`
//!
//! ## Green screen
//!
//! `-g N` turns every pixel whose channels are all `<= N` into pure green
//! (and switches to colour output). `-r` flips the comparison to `> N`; on
//! its own it uses `N = 128`.
//!
//! ## YAML settings file
//!
//! ```yaml
//! max_len: 60
//! output: cat.html
//! color: true
//! green_screen_sensibility: 100
//! reverse_green_screen: false
//! template: template.jinja
//! filter: lanczos3
//! ```
//!
//! Run with: `gif2txt input.gif --settings gif2txt.yaml`. Flags given on the
//! command line take precedence over the file.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{ArgAction, Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing::{info, Level};

use gif2txt_core::{
    convert, ConvertOptions, GlyphMode, GreenScreen, JinjaTemplate, MaxLen, ResizeFilter,
    DEFAULT_OUTPUT, DEFAULT_SENSIBILITY, DEFAULT_TEMPLATE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FilterArg {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<FilterArg> for ResizeFilter {
    fn from(filter: FilterArg) -> Self {
        match filter {
            FilterArg::Nearest => ResizeFilter::Nearest,
            FilterArg::Triangle => ResizeFilter::Triangle,
            FilterArg::CatmullRom => ResizeFilter::CatmullRom,
            FilterArg::Gaussian => ResizeFilter::Gaussian,
            FilterArg::Lanczos3 => ResizeFilter::Lanczos3,
        }
    }
}

/// `max_len` as written in the settings file: a number or any string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum RawMaxLen {
    Int(i64),
    Text(String),
}

impl RawMaxLen {
    fn into_string(self) -> String {
        match self {
            RawMaxLen::Int(n) => n.to_string(),
            RawMaxLen::Text(s) => s,
        }
    }
}

/// YAML settings file format
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Settings {
    #[serde(default)]
    max_len: Option<RawMaxLen>,
    #[serde(default)]
    output: Option<PathBuf>,
    #[serde(default)]
    color: Option<bool>,
    #[serde(default)]
    green_screen_sensibility: Option<i32>,
    #[serde(default)]
    reverse_green_screen: Option<bool>,
    #[serde(default)]
    template: Option<PathBuf>,
    #[serde(default)]
    filter: Option<String>,
}

fn load_settings(path: &PathBuf) -> anyhow::Result<Settings> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file: {:?}", path))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse settings file: {:?}", path))
}

#[derive(Parser, Debug)]
#[command(name = "gif2txt")]
#[command(about = "Render a GIF as ASCII or coloured HTML", long_about = None)]
#[command(arg_required_else_help = true)]
struct Args {
    /// Gif input file
    filename: PathBuf,

    /// Longest side of the output, in glyphs (default 80)
    #[arg(short = 'm', long = "maxLen", visible_alias = "max-len", allow_hyphen_values = true)]
    max_len: Option<String>,

    /// Name of the output file (default out.html)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Render coloured block glyphs instead of ASCII
    #[arg(short, long)]
    color: bool,

    /// Convert black and grey into green; sensibility between 1 and 255, suggested 128
    #[arg(short = 'g', long, allow_negative_numbers = true)]
    green_screen_sensibility: Option<i32>,

    /// Convert white (instead of black) into green; -g still sets the sensibility
    #[arg(short, long)]
    reverse_green_screen: bool,

    /// Jinja template for the HTML page (default template.jinja)
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Resampling filter used when resizing frames
    #[arg(long, value_enum)]
    filter: Option<FilterArg>,

    /// YAML settings file
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Hide the progress spinner
    #[arg(short, long)]
    quiet: bool,
}

/// Everything a run needs after flags and settings are merged
#[derive(Debug)]
struct Resolved {
    options: ConvertOptions,
    template: PathBuf,
}

/// Merge CLI flags over the settings file and apply the flag derivations:
/// reverse without a sensibility uses 128, and any sensibility forces colour.
fn resolve_options(args: &Args, settings: Option<&Settings>) -> anyhow::Result<Resolved> {
    let defaults = Settings::default();
    let settings = settings.unwrap_or(&defaults);

    let raw_max_len = args
        .max_len
        .clone()
        .or_else(|| settings.max_len.clone().map(RawMaxLen::into_string));
    let max_len = MaxLen::parse(raw_max_len.as_deref());

    let output = args
        .output
        .clone()
        .or_else(|| settings.output.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let reverse = args.reverse_green_screen || settings.reverse_green_screen.unwrap_or(false);
    let mut sensibility = args.green_screen_sensibility.or(settings.green_screen_sensibility);
    if reverse && sensibility.is_none() {
        sensibility = Some(DEFAULT_SENSIBILITY);
    }
    let color = args.color || settings.color.unwrap_or(false) || sensibility.is_some();

    let filter = match (args.filter, settings.filter.as_deref()) {
        (Some(filter), _) => ResizeFilter::from(filter),
        (None, Some(name)) => name.parse::<ResizeFilter>().map_err(|e| anyhow::anyhow!(e))?,
        (None, None) => ResizeFilter::default(),
    };

    let template = args
        .template
        .clone()
        .or_else(|| settings.template.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE));

    Ok(Resolved {
        options: ConvertOptions {
            input: args.filename.clone(),
            max_len,
            output,
            mode: if color { GlyphMode::Color } else { GlyphMode::Text },
            green_screen: sensibility.map(|s| GreenScreen::new(s, reverse)),
            filter,
        },
        template,
    })
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> anyhow::Result<()> {
    let settings = args.settings.as_ref().map(load_settings).transpose()?;
    let Resolved { options, template } = resolve_options(args, settings.as_ref())?;

    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} frames")?,
    );
    progress.enable_steady_tick(Duration::from_millis(100));

    let renderer = JinjaTemplate::from_path(template);
    let result = convert(&options, &renderer, |n| progress.set_position(n as u64));
    progress.finish_and_clear();
    let summary = result?;

    info!(
        "Output saved to: {:?} ({} frames, {}x{})",
        options.output, summary.frames, summary.width, summary.height
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<gif2txt_core::Error>() {
                Some(gif2txt_core::Error::FileNotFound(path)) => {
                    eprintln!("file not found: {}", path.display())
                }
                _ => eprintln!("Error: {:?}", err),
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["gif2txt"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let resolved = resolve_options(&parse(&["in.gif"]), None).unwrap();
        let opts = resolved.options;
        assert_eq!(opts.input, PathBuf::from("in.gif"));
        assert_eq!(opts.max_len.value(), 80);
        assert_eq!(opts.output, PathBuf::from("out.html"));
        assert_eq!(opts.mode, GlyphMode::Text);
        assert_eq!(opts.green_screen, None);
        assert_eq!(opts.filter, ResizeFilter::Nearest);
        assert_eq!(resolved.template, PathBuf::from("template.jinja"));
    }

    #[test]
    fn test_short_flags() {
        let args = parse(&["in.gif", "-m", "40", "-o", "x.html", "-c", "-t", "t.jinja"]);
        let resolved = resolve_options(&args, None).unwrap();
        assert_eq!(resolved.options.max_len, MaxLen::Given(40));
        assert_eq!(resolved.options.output, PathBuf::from("x.html"));
        assert_eq!(resolved.options.mode, GlyphMode::Color);
        assert_eq!(resolved.template, PathBuf::from("t.jinja"));
    }

    #[test]
    fn test_long_max_len_spellings() {
        let camel = resolve_options(&parse(&["in.gif", "--maxLen", "33"]), None).unwrap();
        assert_eq!(camel.options.max_len, MaxLen::Given(33));
        let kebab = resolve_options(&parse(&["in.gif", "--max-len", "34"]), None).unwrap();
        assert_eq!(kebab.options.max_len, MaxLen::Given(34));
    }

    #[test]
    fn test_invalid_max_len_falls_back() {
        let resolved = resolve_options(&parse(&["in.gif", "-m", "huge"]), None).unwrap();
        assert_eq!(resolved.options.max_len.value(), 80);
        let negative = resolve_options(&parse(&["in.gif", "-m", "-3"]), None).unwrap();
        assert_eq!(negative.options.max_len.value(), 80);
    }

    #[test]
    fn test_reverse_alone_implies_sensibility_and_color() {
        let resolved = resolve_options(&parse(&["in.gif", "--reverse-green-screen"]), None).unwrap();
        assert_eq!(resolved.options.green_screen, Some(GreenScreen::new(128, true)));
        assert_eq!(resolved.options.mode, GlyphMode::Color);
    }

    #[test]
    fn test_sensibility_forces_color() {
        let resolved = resolve_options(&parse(&["in.gif", "-g", "60"]), None).unwrap();
        assert_eq!(resolved.options.green_screen, Some(GreenScreen::new(60, false)));
        assert_eq!(resolved.options.mode, GlyphMode::Color);
    }

    #[test]
    fn test_out_of_range_sensibility_passed_through() {
        let resolved = resolve_options(&parse(&["in.gif", "-r", "-g", "-7"]), None).unwrap();
        assert_eq!(resolved.options.green_screen, Some(GreenScreen::new(-7, true)));
        let resolved = resolve_options(&parse(&["in.gif", "-g", "999"]), None).unwrap();
        assert_eq!(resolved.options.green_screen, Some(GreenScreen::new(999, false)));
    }

    #[test]
    fn test_settings_fill_unset_flags() {
        let settings: Settings = serde_yaml::from_str(
            "max_len: 50\noutput: from-file.html\ncolor: true\nfilter: lanczos3\ntemplate: page.jinja\n",
        )
        .unwrap();
        let resolved = resolve_options(&parse(&["in.gif"]), Some(&settings)).unwrap();
        assert_eq!(resolved.options.max_len, MaxLen::Given(50));
        assert_eq!(resolved.options.output, PathBuf::from("from-file.html"));
        assert_eq!(resolved.options.mode, GlyphMode::Color);
        assert_eq!(resolved.options.filter, ResizeFilter::Lanczos3);
        assert_eq!(resolved.template, PathBuf::from("page.jinja"));
    }

    #[test]
    fn test_flags_override_settings() {
        let settings: Settings =
            serde_yaml::from_str("max_len: \"50\"\noutput: from-file.html\nfilter: gaussian\n").unwrap();
        let args = parse(&["in.gif", "-m", "20", "-o", "cli.html", "--filter", "triangle"]);
        let resolved = resolve_options(&args, Some(&settings)).unwrap();
        assert_eq!(resolved.options.max_len, MaxLen::Given(20));
        assert_eq!(resolved.options.output, PathBuf::from("cli.html"));
        assert_eq!(resolved.options.filter, ResizeFilter::Triangle);
    }

    #[test]
    fn test_settings_reverse_derivation() {
        let settings: Settings = serde_yaml::from_str("reverse_green_screen: true\n").unwrap();
        let resolved = resolve_options(&parse(&["in.gif"]), Some(&settings)).unwrap();
        assert_eq!(resolved.options.green_screen, Some(GreenScreen::new(128, true)));
        assert_eq!(resolved.options.mode, GlyphMode::Color);
    }

    #[test]
    fn test_settings_reject_unknown_keys_and_filters() {
        assert!(serde_yaml::from_str::<Settings>("colour: true\n").is_err());
        let settings: Settings = serde_yaml::from_str("filter: bicubic\n").unwrap();
        assert!(resolve_options(&parse(&["in.gif"]), Some(&settings)).is_err());
    }
}
