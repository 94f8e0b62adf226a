use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("metaprobe")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Metaprobe Contributors")
        .about("Extract link metadata from web pages")
        .arg(clap::arg!(<INPUT> "URL to scrape, local HTML file, or '-' for stdin"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (json, text)")
                .value_name("FORMAT")
                .default_value("json")
                .value_parser(["json", "text"]),
        )
        .arg(clap::arg!(--compact "Print JSON on a single line"))
        .arg(
            clap::arg!(--"base-url" <URL> "Base URL for resolving relative links in local input")
                .default_value("http://localhost/"),
        )
        .arg(clap::arg!(--timeout <SECS> "Page fetch timeout in seconds").default_value("15"))
        .arg(clap::arg!(--"image-timeout" <SECS> "Image and favicon fetch timeout in seconds").default_value("10"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests").value_name("UA"))
        .arg(clap::arg!(-v --verbose "Show progress on stderr"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "metaprobe", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "metaprobe", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "metaprobe", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "metaprobe", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
