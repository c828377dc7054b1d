use std::process::Command;

fn main() {
    // Release pipelines pass MACHINA_VERSION; local builds derive one from
    // the working tree when git is available.
    if let Ok(version) = std::env::var("MACHINA_VERSION") {
        println!("cargo:rustc-env=MACHINA_VERSION={version}");
    } else if let Ok(output) = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        && output.status.success()
    {
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        println!("cargo:rustc-env=MACHINA_VERSION={version}");
    }

    println!("cargo:rerun-if-env-changed=MACHINA_VERSION");
}
