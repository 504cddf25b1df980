use clap::Parser;
use favkit_cli::{Cli, Command, ConfigCommand, FillArg, FilterArg};
use favkit_core::config::{CanvasPreferences, ExportPreferences};
use favkit_core::{Fill, MAX_DIMENSION, ResampleFilter};

// Integration tests for argument parsing and the way command-line values
// override configuration defaults.

#[test]
fn test_canvas_defaults_come_from_config() {
    let cli = Cli::try_parse_from(["favkit", "canvas", "--out", "icon.png"]).expect("parse");
    let Command::Canvas(args) = cli.command else {
        panic!("expected canvas command");
    };
    let spec = args.to_spec(&CanvasPreferences::default());
    assert_eq!((spec.width, spec.height), (46, 46));
    assert_eq!(spec.resolution, 72.0);
    assert_eq!(spec.fill, Fill::White);
    assert!(!args.force);
}

#[test]
fn test_canvas_overrides() {
    let cli = Cli::try_parse_from([
        "favkit",
        "canvas",
        "-o",
        "icon.png",
        "--width",
        "64",
        "--height",
        "32",
        "--resolution",
        "144",
        "--fill",
        "transparent",
        "--force",
    ])
    .expect("parse");
    let Command::Canvas(args) = cli.command else {
        panic!("expected canvas command");
    };
    assert_eq!(args.fill, Some(FillArg::Transparent));
    let spec = args.to_spec(&CanvasPreferences::default());
    assert_eq!((spec.width, spec.height), (64, 32));
    assert_eq!(spec.resolution, 144.0);
    assert_eq!(spec.fill, Fill::Transparent);
    assert!(args.force);
}

#[test]
fn test_canvas_requires_out() {
    assert!(Cli::try_parse_from(["favkit", "canvas"]).is_err());
}

#[test]
fn test_export_arguments() {
    let cli = Cli::try_parse_from([
        "favkit",
        "export",
        "logo.png",
        "--out-dir",
        "/tmp/icons",
        "--filter",
        "lanczos",
        "--small-size",
        "16",
        "--json",
    ])
    .expect("parse");
    let Command::Export(args) = cli.command else {
        panic!("expected export command");
    };
    assert_eq!(args.filter, Some(FilterArg::Lanczos));
    assert!(args.json);
    assert!(!args.remember);

    let prefs = ExportPreferences::default();
    assert_eq!(args.resample(&prefs), ResampleFilter::Lanczos);
    assert_eq!(args.options(&prefs).expect("options").small_size, 16);
    assert_eq!(
        args.destination(&prefs),
        Some(std::path::PathBuf::from("/tmp/icons"))
    );
}

#[test]
fn test_export_falls_back_to_remembered_folder() {
    let cli = Cli::try_parse_from(["favkit", "export", "logo.png"]).expect("parse");
    let Command::Export(args) = cli.command else {
        panic!("expected export command");
    };

    let mut prefs = ExportPreferences::default();
    assert_eq!(args.destination(&prefs), None);
    assert_eq!(args.resample(&prefs), ResampleFilter::Bicubic);
    assert_eq!(args.options(&prefs).expect("options").small_size, 23);

    prefs.last_folder = Some("/srv/site/icons".into());
    assert_eq!(
        args.destination(&prefs),
        Some(std::path::PathBuf::from("/srv/site/icons"))
    );
}

#[test]
fn test_export_rejects_zero_small_size() {
    let cli = Cli::try_parse_from(["favkit", "export", "logo.png", "--small-size", "0"])
        .expect("parse");
    let Command::Export(args) = cli.command else {
        panic!("expected export command");
    };
    assert!(args.options(&ExportPreferences::default()).is_err());
}

#[test]
fn test_export_rejects_oversized_small_size() {
    let too_big = (MAX_DIMENSION + 1).to_string();
    let cli = Cli::try_parse_from(["favkit", "export", "logo.png", "--small-size", &too_big])
        .expect("parse");
    let Command::Export(args) = cli.command else {
        panic!("expected export command");
    };
    let err = args.options(&ExportPreferences::default()).unwrap_err();
    assert!(err.contains("--small-size"), "{err}");

    let at_limit = MAX_DIMENSION.to_string();
    let cli = Cli::try_parse_from(["favkit", "export", "logo.png", "--small-size", &at_limit])
        .expect("parse");
    let Command::Export(args) = cli.command else {
        panic!("expected export command");
    };
    let options = args.options(&ExportPreferences::default()).expect("options");
    assert_eq!(options.small_size, MAX_DIMENSION);
}

#[test]
fn test_unknown_filter_is_rejected() {
    assert!(Cli::try_parse_from(["favkit", "export", "logo.png", "--filter", "box"]).is_err());
}

#[test]
fn test_config_subcommands() {
    let cli = Cli::try_parse_from(["favkit", "config", "path"]).expect("parse");
    assert!(matches!(cli.command, Command::Config(ConfigCommand::Path)));
    let cli = Cli::try_parse_from(["favkit", "config", "reset"]).expect("parse");
    assert!(matches!(cli.command, Command::Config(ConfigCommand::Reset)));
}
