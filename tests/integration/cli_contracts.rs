use clap::{CommandFactory, Parser};
use repowalk::tooling::cli::Cli;

#[test]
fn parse_valid_command_matrix() {
    let uri = "walker://octo/hello?access_token=t";
    let cases: Vec<Vec<&str>> = vec![
        vec!["repowalk", "--walker-uri", uri, ""],
        vec!["repowalk", "--walker-uri", uri, "/"],
        vec!["repowalk", "--walker-uri", uri, "src", "docs"],
        vec!["repowalk", "--walker-uri", uri, "--verbose", "src"],
        vec![
            "repowalk",
            "--walker-uri",
            uri,
            "--log-format",
            "json",
            "--log-output",
            "file",
            "--log-file",
            "/tmp/repowalk.log",
            "src",
        ],
        vec!["repowalk", "--config", "./repowalk.toml", "--walker-uri", uri, "src"],
    ];

    for args in cases {
        let parsed = Cli::try_parse_from(args.clone());
        assert!(parsed.is_ok(), "expected valid parse for args: {args:?}");
    }
}

#[test]
fn parse_rejects_missing_uri_or_paths() {
    assert!(Cli::try_parse_from(["repowalk", "src"]).is_err());
    assert!(Cli::try_parse_from(["repowalk", "--walker-uri", "walker://octo/hello"]).is_err());
}

#[test]
fn help_mentions_every_flag() {
    let mut command = Cli::command();
    let mut output = Vec::new();
    command.write_long_help(&mut output).unwrap();
    let output = String::from_utf8(output).unwrap();

    for token in [
        "--walker-uri",
        "--config",
        "--verbose",
        "--log-level",
        "--log-format",
        "--log-output",
        "--log-file",
    ] {
        assert!(output.contains(token), "help is missing {}", token);
    }
}
