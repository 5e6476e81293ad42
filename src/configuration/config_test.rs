use anyhow::Result;

use super::Config;
use super::ConfigKey;
use crate::application::cli;

#[test]
fn it_serializes_to_valid_toml() {
    let res = Config::serialize_default(cli::build());

    let doc = res.parse::<toml_edit::Document>().unwrap();
    assert_eq!(doc.get("backend").unwrap().as_str().unwrap(), "groq");
    assert_eq!(doc.get("port").unwrap().as_integer().unwrap(), 3000);
    assert_eq!(doc.get("widget-theme").unwrap().as_str().unwrap(), "light");

    // Empty defaults such as tokens stay commented out.
    assert!(doc.get("groq-token").is_none());
    assert!(res.contains("# groq-token = \"\""));
    assert!(doc.get("config-file").is_none());
}

#[tokio::test]
async fn it_loads_config_from_file() -> Result<()> {
    let matches =
        cli::build().try_get_matches_from(vec!["stockchat", "-c", "./config.example.toml"])?;
    Config::load(cli::build(), vec![&matches]).await?;
    assert_eq!(Config::get(ConfigKey::Backend), "groq");
    return Ok(());
}

#[tokio::test]
async fn it_fails_to_loads_config_from_file() -> Result<()> {
    let matches =
        cli::build().try_get_matches_from(vec!["stockchat", "-c", "./test/bad-config.toml"])?;
    let res = Config::load(cli::build(), vec![&matches]).await;
    assert!(res.is_err());
    return Ok(());
}
