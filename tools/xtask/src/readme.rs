use std::env;
use std::fs;
use std::io::Write;
use std::process;

fn cmd(args: Vec<&str>) -> String {
    let mut child = process::Command::new("./target/debug/stockchat");
    for arg in args {
        child.arg(arg);
    }

    for (key, _) in env::vars() {
        if key.starts_with("STOCKCHAT_") {
            child.env(key, "");
        }
    }
    for key in ["GROQ_API_KEY", "OPENAI_API_KEY", "SERP_API_KEY"] {
        child.env(key, "");
    }

    return String::from_utf8(child.env("NO_COLOR", "1").output().unwrap().stdout).unwrap();
}

pub fn update() {
    let output_help = cmd(vec!["--help"]);
    let output_help_serve = cmd(vec!["serve", "--help"])
        .split("Options:")
        .next()
        .unwrap()
        .trim()
        .to_string();
    let output_config = cmd(vec!["config", "--help"])
        .split("Options:")
        .next()
        .unwrap()
        .trim()
        .to_string();
    let output_config_default = cmd(vec!["config", "default"]).trim().to_string();

    let mut readme = fs::read_to_string("./README.md").unwrap();

    let start_help = readme.find("<!-- command-help start -->").unwrap();
    let end_help = readme.find("<!-- command-help end -->").unwrap();
    readme.replace_range(
        start_help..end_help,
        &format!("<!-- command-help start -->\n```\n{output_help}```\n"),
    );

    let start_help_serve = readme.find("<!-- command-help-serve start -->").unwrap();
    let end_help_serve = readme.find("<!-- command-help-serve end -->").unwrap();
    readme.replace_range(
        start_help_serve..end_help_serve,
        &format!("<!-- command-help-serve start -->\n```\n{output_help_serve}\n```\n"),
    );

    let start_help_config = readme.find("<!-- command-config start -->").unwrap();
    let end_help_config = readme.find("<!-- command-config end -->").unwrap();
    readme.replace_range(
        start_help_config..end_help_config,
        &format!("<!-- command-config start -->\n```\n{output_config}\n```\n"),
    );

    let start_config_default = readme.find("<!-- config-default start -->").unwrap();
    let end_config_default = readme.find("<!-- config-default end -->").unwrap();
    readme.replace_range(
        start_config_default..end_config_default,
        &format!("<!-- config-default start -->\n```toml\n{output_config_default}\n```\n"),
    );

    readme = readme.replace(&env::var("HOME").unwrap(), "~");

    let mut f = fs::File::create("./README.md").unwrap();
    f.write_all(readme.as_bytes()).unwrap();
}
