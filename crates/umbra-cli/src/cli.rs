//! Command definitions and dispatch.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use umbra::env::{ClassList, EnvReader, Environment};
use umbra::tokens::Palette;
use umbra::{ColorMode, Config, ModeSource, PreferenceOptions, ThemePreference};

#[derive(Debug, Parser)]
#[command(name = "umbra", version, about = "Read, change and style the light/dark theme preference")]
pub struct Cli {
    /// YAML config file (defaults to $UMBRA_CONFIG)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Preference file, overriding the config and directory lookup
    #[arg(long, global = true, value_name = "FILE")]
    pub store: Option<PathBuf>,

    /// YAML palette overrides
    #[arg(long, global = true, value_name = "FILE")]
    pub palette: Option<PathBuf>,

    /// Behave as if no display were attached: nothing is read or saved
    #[arg(long, global = true)]
    pub headless: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the current mode
    Get {
        /// Also print where the mode came from
        #[arg(long)]
        source: bool,
    },
    /// Set and save the mode
    Set {
        #[arg(value_enum)]
        mode: ModeArg,
    },
    /// Flip the mode and save it
    Toggle,
    /// Emit the design-token palette
    Tokens {
        #[arg(long, value_enum, default_value_t = TokenFormat::Css)]
        format: TokenFormat,
    },
    /// Show the palette as terminal swatches
    Swatch {
        /// Mode to show (defaults to the current one)
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Light,
    Dark,
}

impl From<ModeArg> for ColorMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Light => ColorMode::Light,
            ModeArg::Dark => ColorMode::Dark,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TokenFormat {
    Css,
    Json,
    Yaml,
}

impl Cli {
    fn load_config(&self, vars: &dyn EnvReader) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => Config::from_env(vars).context("loading config from UMBRA_CONFIG")?,
        };
        if let Some(store) = &self.store {
            config.store_path = Some(store.clone());
        }
        if let Some(palette) = &self.palette {
            config.palette_path = Some(palette.clone());
        }
        Ok(config)
    }
}

/// Runs one command, writing user-facing output to `out`.
pub fn run(cli: &Cli, vars: &dyn EnvReader, out: &mut dyn Write) -> Result<()> {
    let config = cli.load_config(vars)?;

    let open_theme = || {
        let env = Environment::detect(&config, vars, cli.headless, ClassList::new());
        ThemePreference::initialize(env, PreferenceOptions::from(&config))
    };

    match &cli.command {
        Command::Get { source } => {
            let theme = open_theme();
            if *source {
                writeln!(out, "{} ({})", theme.get(), source_label(theme.source()))?;
            } else {
                writeln!(out, "{}", theme.get())?;
            }
        }
        Command::Set { mode } => {
            let theme = open_theme();
            theme.set((*mode).into());
            warn_if_unsaved(&theme);
            writeln!(out, "{}", theme.get())?;
        }
        Command::Toggle => {
            let theme = open_theme();
            let mode = theme.toggle();
            warn_if_unsaved(&theme);
            writeln!(out, "{}", mode)?;
        }
        Command::Tokens { format } => {
            let palette = load_palette(&config)?;
            let rendered = match format {
                TokenFormat::Css => palette.to_css(&config.dark_class),
                TokenFormat::Json => palette.to_json()? + "\n",
                TokenFormat::Yaml => palette.to_yaml()?,
            };
            out.write_all(rendered.as_bytes())?;
        }
        Command::Swatch { mode } => {
            let palette = load_palette(&config)?;
            let mode = match mode {
                Some(mode) => ColorMode::from(*mode),
                None => open_theme().get(),
            };
            let resolved = palette.resolve(mode);
            writeln!(out, "{} palette", resolved.mode)?;
            for (role, rgb) in &resolved.colors {
                let label = format!(" {:<10} {} ", role, rgb);
                writeln!(out, "{}", palette.style(*role, mode).apply_to(label))?;
            }
        }
    }
    Ok(())
}

fn load_palette(config: &Config) -> Result<Palette> {
    match &config.palette_path {
        Some(path) => Palette::from_file(path)
            .with_context(|| format!("loading palette {}", path.display())),
        None => Ok(Palette::default()),
    }
}

fn source_label(source: ModeSource) -> &'static str {
    match source {
        ModeSource::Persisted => "saved preference",
        ModeSource::System => "system setting",
        ModeSource::Default => "default",
    }
}

fn warn_if_unsaved(theme: &ThemePreference) {
    if theme.environment().is_headless() {
        tracing::warn!("no display environment; the preference was not saved");
    }
}
