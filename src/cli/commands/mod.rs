pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

pub const ARG_PORT: &str = "port";
pub const ARG_API_URL: &str = "api-url";
pub const ARG_JWT_ACCESS_SECRET: &str = "jwt-access-secret";
pub const ARG_SECURE_COOKIES: &str = "secure-cookies";

const DEFAULT_API_URL: &str = "http://localhost:5000/api";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("arise-gateway")
        .about("Session gateway for the Arise fitness platform")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("ARISE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_API_URL)
                .long("api-url")
                .help("Base URL of the Arise backend API")
                .default_value(DEFAULT_API_URL)
                .env("ARISE_API_URL"),
        )
        .arg(
            Arg::new(ARG_JWT_ACCESS_SECRET)
                .long("jwt-access-secret")
                .help("HS256 secret used to verify access tokens locally")
                .env("ARISE_JWT_ACCESS_SECRET")
                .required(true),
        )
        .arg(
            Arg::new(ARG_SECURE_COOKIES)
                .long("secure-cookies")
                .help("Mark token cookies Secure (enable when serving over HTTPS)")
                .env("ARISE_SECURE_COOKIES")
                .action(ArgAction::SetTrue),
        );

    logging::with_args(command)
}
