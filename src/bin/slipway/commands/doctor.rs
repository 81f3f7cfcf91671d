//! `slipway doctor` - report on required build tools.

use anyhow::Result;

use slipway::stages::tools::probe_tools;

use crate::cli::DoctorArgs;

pub fn execute(_args: DoctorArgs) -> Result<()> {
    let checks = probe_tools();
    let mut all_ok = true;

    for check in &checks {
        let status = if check.ok { "ok" } else { "MISSING" };
        let detail = match (&check.found, &check.version) {
            (Some(path), Some(version)) => format!("{} ({})", path.display(), version),
            (Some(path), None) => path.display().to_string(),
            _ => "not found".to_string(),
        };
        println!("{:12} {:8} {}", check.name, status, detail);

        if let Some(ref hint) = check.hint {
            println!("{:12} {:8} hint: {}", "", "", hint);
        }

        all_ok &= check.ok;
    }

    if !all_ok {
        anyhow::bail!("some required build tools are missing");
    }

    println!("all build tools present");
    Ok(())
}
