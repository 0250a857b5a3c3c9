fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");

    let git = |args: &[&str]| {
        std::process::Command::new("git")
            .args(args)
            .output()
            .ok()
            .filter(|o| o.status.success())
    };

    // Tagged builds report the crate version, everything else `dev@<hash>`.
    let version = if git(&["describe", "--exact-match", "--tags", "HEAD"]).is_some() {
        std::env::var("CARGO_PKG_VERSION").unwrap_or_default()
    } else {
        match git(&["rev-parse", "--short", "HEAD"]) {
            Some(o) => format!("dev@{}", String::from_utf8_lossy(&o.stdout).trim()),
            None => "dev@unknown".to_string(),
        }
    };

    println!("cargo:rustc-env=CLOUDPHOTO_VERSION={version}");
}
