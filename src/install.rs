use std::path::{Path, PathBuf};

use anyhow::Context;

pub const SENDER_SERVICE_NAME: &str = "prompipe-sender";
const UNIT_DIR: &str = "/etc/systemd/system";

/// Renders a systemd unit that runs `exec_start` from `working_dir`.
pub fn render_unit(description: &str, exec_start: &str, working_dir: &Path) -> String {
    format!(
        "[Unit]\n\
         Description={description}\n\
         After=network-online.target\n\
         Wants=network-online.target\n\
         \n\
         [Service]\n\
         ExecStart={exec_start}\n\
         WorkingDirectory={}\n\
         Restart=always\n\
         \n\
         [Install]\n\
         WantedBy=multi-user.target\n",
        working_dir.display()
    )
}

/// Writes the sender's unit file and returns the follow-up commands to run.
pub fn install_sender_service() -> anyhow::Result<String> {
    let exe = std::env::current_exe().context("cannot locate current executable")?;
    let cwd = std::env::current_dir().context("cannot read working directory")?;

    let unit = render_unit(
        "Prometheus pipe sender",
        &format!("{} sender", exe.display()),
        &cwd,
    );
    let path = unit_path(SENDER_SERVICE_NAME);
    std::fs::write(&path, unit).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "installed systemd unit");

    Ok(format!(
        "Wrote unit file to {}\n\
         Enable on boot:  systemctl enable {SENDER_SERVICE_NAME}\n\
         Start now:       systemctl start {SENDER_SERVICE_NAME}\n\
         Follow logs:     journalctl -fu {SENDER_SERVICE_NAME}",
        path.display()
    ))
}

fn unit_path(service: &str) -> PathBuf {
    Path::new(UNIT_DIR).join(format!("{service}.service"))
}
