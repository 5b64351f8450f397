// Version string for --version, with the git short hash when built from a checkout.
fn main() {
    let version = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
    let hash = std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|raw| raw.trim().to_owned())
        .filter(|hash| !hash.is_empty());

    let long_version = match hash {
        Some(hash) => format!("{version} ({hash})"),
        None => version,
    };
    println!("cargo:rustc-env=GLYPHDRIFT_LONG_VERSION={long_version}");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
