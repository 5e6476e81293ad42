use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::IntoEnumIterator;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendName;
use crate::domain::models::ToolName;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if !config_file_path.parent().unwrap().exists() {
        fs::create_dir_all(config_file_path.parent().unwrap()).await?;
    }

    let mut file = fs::File::create(config_file_path.clone()).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    let config_path_display = config_file_path.as_os_str().to_str().unwrap();
    println!("Created default config file at {config_path_display}");
    return Ok(());
}

fn tools_text() -> String {
    let header = Paint::new("TOOLS:").underline().bold().to_string();
    let lines = ToolName::iter()
        .map(|tool| {
            return format!("  - {tool}: {}", tool.description());
        })
        .collect::<Vec<String>>()
        .join("\n");

    return format!("{header}\n{lines}");
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for Stockchat")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running Stockchat with environment variable RUST_LOG=stockchat")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        )
        .subcommand(
            Command::new("tools").about("Output the tool menu offered to models, as JSON schemas.")
        );
}

fn arg_backend() -> Arg {
    return Arg::new(ConfigKey::Backend.to_string())
        .short('b')
        .long(ConfigKey::Backend.to_string())
        .env("STOCKCHAT_BACKEND")
        .num_args(1)
        .help(format!(
            "The backend hosting a model to connect to. [default: {}]",
            Config::default(ConfigKey::Backend)
        ))
        .value_parser(PossibleValuesParser::new(BackendName::VARIANTS));
}

fn arg_backend_health_check_timeout() -> Arg {
    return Arg::new(ConfigKey::BackendHealthCheckTimeout.to_string())
        .long(ConfigKey::BackendHealthCheckTimeout.to_string())
        .env("STOCKCHAT_BACKEND_HEALTH_CHECK_TIMEOUT")
        .num_args(1)
        .help(
            format!("Time to wait in milliseconds before timing out when doing a healthcheck for a backend. [default: {}]", Config::default(ConfigKey::BackendHealthCheckTimeout)),
        );
}

fn arg_model() -> Arg {
    return Arg::new(ConfigKey::Model.to_string())
        .short('m')
        .long(ConfigKey::Model.to_string())
        .env("STOCKCHAT_MODEL")
        .num_args(1)
        .help("The model on a backend to consume. Defaults to a known model for the selected backend if not set.");
}

fn arg_caption_model() -> Arg {
    return Arg::new(ConfigKey::CaptionModel.to_string())
        .long(ConfigKey::CaptionModel.to_string())
        .env("STOCKCHAT_CAPTION_MODEL")
        .num_args(1)
        .help("The model used to caption widgets. Defaults to the conversation model if not set.");
}

fn arg_host() -> Arg {
    return Arg::new(ConfigKey::Host.to_string())
        .long(ConfigKey::Host.to_string())
        .env("STOCKCHAT_HOST")
        .num_args(1)
        .help(format!(
            "The address the server binds to. [default: {}]",
            Config::default(ConfigKey::Host)
        ));
}

fn arg_port() -> Arg {
    return Arg::new(ConfigKey::Port.to_string())
        .short('p')
        .long(ConfigKey::Port.to_string())
        .env("STOCKCHAT_PORT")
        .num_args(1)
        .help(format!(
            "The port the server binds to. [default: {}]",
            Config::default(ConfigKey::Port)
        ));
}

fn subcommand_serve() -> Command {
    return Command::new("serve")
        .about("Start the chat server.")
        .arg(arg_backend())
        .arg(arg_backend_health_check_timeout())
        .arg(arg_model())
        .arg(arg_caption_model())
        .arg(arg_host())
        .arg(arg_port());
}

pub fn build() -> Command {
    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    );

    return Command::new("stockchat")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(tools_text())
        .arg_required_else_help(false)
        .subcommand(subcommand_serve())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .arg(arg_backend())
        .arg(arg_backend_health_check_timeout())
        .arg(arg_model())
        .arg(arg_caption_model())
        .arg(arg_host())
        .arg(arg_port())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("STOCKCHAT_CONFIG_FILE")
                .num_args(1)
                .help(format!(
                    "Path to configuration file [default: {}]",
                    Config::default(ConfigKey::ConfigFile)
                ))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::GroqURL.to_string())
                .long(ConfigKey::GroqURL.to_string())
                .env("STOCKCHAT_GROQ_URL")
                .num_args(1)
                .help(format!("Groq API URL when using the Groq backend. Can be swapped to a compatible proxy. [default: {}]", Config::default(ConfigKey::GroqURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::GroqToken.to_string())
                .long(ConfigKey::GroqToken.to_string())
                .env("GROQ_API_KEY")
                .num_args(1)
                .help("Groq API token when using the Groq backend.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::OpenAiURL.to_string())
                .long(ConfigKey::OpenAiURL.to_string())
                .env("STOCKCHAT_OPENAI_URL")
                .num_args(1)
                .help(format!("OpenAI API URL when using the OpenAI backend. Can be swapped to a compatible proxy. [default: {}]", Config::default(ConfigKey::OpenAiURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::OpenAiToken.to_string())
                .long(ConfigKey::OpenAiToken.to_string())
                .env("OPENAI_API_KEY")
                .num_args(1)
                .help("OpenAI API token when using the OpenAI backend.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::SerpURL.to_string())
                .long(ConfigKey::SerpURL.to_string())
                .env("STOCKCHAT_SERP_URL")
                .num_args(1)
                .help(format!("Serper API URL backing the web search tool. [default: {}]", Config::default(ConfigKey::SerpURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::SerpToken.to_string())
                .long(ConfigKey::SerpToken.to_string())
                .env("SERP_API_KEY")
                .num_args(1)
                .help("Serper API token backing the web search tool. The search tool is left off the tool menu when unset.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::WidgetTheme.to_string())
                .short('t')
                .long(ConfigKey::WidgetTheme.to_string())
                .env("STOCKCHAT_WIDGET_THEME")
                .num_args(1)
                .help(format!(
                    "Color theme embedded widgets are rendered with. [default: {}]",
                    Config::default(ConfigKey::WidgetTheme)
                ))
                .value_parser(PossibleValuesParser::new(["light", "dark"]))
                .global(true),
        );
}

pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    let log_path = dirs::cache_dir().unwrap().join("stockchat/debug.log");
                    println!("{}", log_path.to_str().unwrap());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                Some(("tools", _)) => {
                    println!("{}", serde_json::to_string_pretty(&ToolName::menu(true))?);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(false);
        }
        Some(("serve", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(true);
}
