//! Auto-start mechanism, in two variants
//!
//! Profile variant: a marker-delimited block in the principal's login
//! profile starts the X session on the chosen virtual terminal when no
//! display is attached, paired with a getty auto-login drop-in for that
//! terminal. The block is replaced on re-run, never appended twice.
//!
//! Service variant: a supervised systemd unit owns session startup, so the
//! login-profile hook is removed when switching to it, since leaving both
//! in place would double-start the session.

use std::fs;
use std::path::PathBuf;

use crate::common::fs::{Owner, write_owned, write_system};
use crate::context::{AutostartVariant, InstallationContext};
use crate::error::Result;
use crate::exec;

const BLOCK_BEGIN: &str = "# >>> kioskctl autostart >>>";
const BLOCK_END: &str = "# <<< kioskctl autostart <<<";

/// Which auto-start files a run produced.
#[derive(Debug)]
pub enum AutostartDescriptor {
    ProfileHook {
        login_profile: PathBuf,
        autologin_dropin: PathBuf,
    },
    ServiceUnit {
        unit: PathBuf,
    },
}

impl AutostartDescriptor {
    /// Paths the verifier existence-checks.
    pub fn paths(&self) -> Vec<&PathBuf> {
        match self {
            AutostartDescriptor::ProfileHook {
                login_profile,
                autologin_dropin,
            } => vec![login_profile, autologin_dropin],
            AutostartDescriptor::ServiceUnit { unit } => vec![unit],
        }
    }
}

pub fn login_profile_path(ctx: &InstallationContext) -> PathBuf {
    ctx.principal.home.join(".bash_profile")
}

pub fn autologin_dropin_path(ctx: &InstallationContext) -> PathBuf {
    PathBuf::from(format!(
        "/etc/systemd/system/getty@tty{}.service.d/autologin.conf",
        ctx.vt
    ))
}

pub fn service_unit_path(ctx: &InstallationContext) -> PathBuf {
    PathBuf::from(format!(
        "/etc/systemd/system/{}-kiosk.service",
        ctx.product
    ))
}

pub fn service_unit_name(ctx: &InstallationContext) -> String {
    format!("{}-kiosk.service", ctx.product)
}

/// The marker-delimited login-profile block.
pub fn render_profile_block(ctx: &InstallationContext) -> String {
    format!(
        "{BLOCK_BEGIN}\n\
         if [ -z \"$DISPLAY\" ] && [ \"$(tty)\" = \"/dev/tty{vt}\" ]; then\n\
         \x20   startx -- :{display} vt{vt}\n\
         fi\n\
         {BLOCK_END}",
        vt = ctx.vt,
        display = ctx.display,
    )
}

/// Getty auto-login drop-in for the chosen virtual terminal.
pub fn render_autologin_dropin(ctx: &InstallationContext) -> String {
    format!(
        "[Service]\n\
         ExecStart=\n\
         ExecStart=-/sbin/agetty --autologin {user} --noclear %I $TERM\n",
        user = ctx.principal.name,
    )
}

/// Supervised service unit that owns session startup.
pub fn render_service_unit(ctx: &InstallationContext) -> String {
    format!(
        "[Unit]\n\
         Description={product} kiosk session\n\
         Wants=network-online.target\n\
         After=network-online.target graphical.target\n\
         \n\
         [Service]\n\
         User={user}\n\
         PAMName=login\n\
         TTYPath=/dev/tty{vt}\n\
         Restart=on-failure\n\
         RestartSec=5\n\
         ExecStart=/usr/bin/startx {home}/.xinitrc -- :{display} vt{vt}\n\
         \n\
         [Install]\n\
         WantedBy=graphical.target\n",
        product = ctx.product,
        user = ctx.principal.name,
        home = ctx.principal.home.display(),
        vt = ctx.vt,
        display = ctx.display,
    )
}

/// Insert or replace the marker-delimited block in login-profile content.
/// Applying the same block twice yields identical output.
pub fn upsert_profile_block(existing: &str, block: &str) -> String {
    let stripped = remove_profile_block(existing);
    if stripped.is_empty() {
        format!("{block}\n")
    } else {
        format!("{}\n{block}\n", stripped.trim_end())
    }
}

/// Remove the marker-delimited block, if present.
pub fn remove_profile_block(existing: &str) -> String {
    let Some(begin) = existing.find(BLOCK_BEGIN) else {
        return existing.to_string();
    };
    let Some(end) = existing[begin..].find(BLOCK_END) else {
        return existing.to_string();
    };
    let after = begin + end + BLOCK_END.len();
    let mut result = String::new();
    result.push_str(existing[..begin].trim_end());
    let tail = existing[after..].trim_start_matches('\n');
    if !tail.is_empty() {
        if !result.is_empty() {
            result.push('\n');
        }
        result.push_str(tail);
    }
    result
}

/// Write the auto-start files for the configured variant and register them
/// with systemd.
pub fn apply(ctx: &InstallationContext) -> Result<AutostartDescriptor> {
    match ctx.autostart {
        AutostartVariant::Profile => {
            let login_profile = write_profile_hook(ctx)?;
            let dropin = autologin_dropin_path(ctx);
            write_system(&dropin, &render_autologin_dropin(ctx))?;
            exec::run("systemctl", &["daemon-reload"])?;
            Ok(AutostartDescriptor::ProfileHook {
                login_profile,
                autologin_dropin: dropin,
            })
        }
        AutostartVariant::Service => {
            // The unit owns session startup; a leftover profile hook would
            // start a second session on the autologin VT.
            remove_profile_hook(ctx)?;
            let unit = service_unit_path(ctx);
            write_system(&unit, &render_service_unit(ctx))?;
            exec::run("systemctl", &["daemon-reload"])?;
            exec::run("systemctl", &["enable", &service_unit_name(ctx)])?;
            Ok(AutostartDescriptor::ServiceUnit { unit })
        }
    }
}

/// Upsert the autostart block into the principal's login profile.
pub fn write_profile_hook(ctx: &InstallationContext) -> Result<PathBuf> {
    let path = login_profile_path(ctx);
    let existing = fs::read_to_string(&path).unwrap_or_default();
    let updated = upsert_profile_block(&existing, &render_profile_block(ctx));
    let owner = Owner {
        uid: ctx.principal.uid,
        gid: ctx.principal.gid,
    };
    write_owned(&path, &updated, 0o644, owner)?;
    Ok(path)
}

/// Drop the autostart block from the login profile, if the file exists.
pub fn remove_profile_hook(ctx: &InstallationContext) -> Result<()> {
    let path = login_profile_path(ctx);
    let Ok(existing) = fs::read_to_string(&path) else {
        return Ok(());
    };
    let updated = remove_profile_block(&existing);
    if updated != existing {
        let owner = Owner {
            uid: ctx.principal.uid,
            gid: ctx.principal.gid,
        };
        write_owned(&path, &updated, 0o644, owner)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Principal;
    use std::os::unix::fs::MetadataExt;
    use tempfile::TempDir;

    fn test_ctx(home: PathBuf, variant: AutostartVariant) -> InstallationContext {
        let (uid, gid) = fs::metadata(&home)
            .map(|m| (m.uid(), m.gid()))
            .unwrap_or((1000, 1000));
        InstallationContext {
            principal: Principal {
                name: "kiosk".to_string(),
                uid,
                gid,
                home,
            },
            repo: "acme/helloscreen".to_string(),
            product: "helloscreen".to_string(),
            install_root: PathBuf::from("/opt/helloscreen"),
            arch_tag: "arm64".to_string(),
            autostart: variant,
            display: 0,
            vt: 1,
            source_dir: PathBuf::from("."),
            verbose: false,
        }
    }

    #[test]
    fn test_profile_block_guards_on_display_and_tty() {
        let ctx = test_ctx(PathBuf::from("/home/kiosk"), AutostartVariant::Profile);
        let block = render_profile_block(&ctx);
        assert!(block.contains(r#"[ -z "$DISPLAY" ]"#));
        assert!(block.contains("/dev/tty1"));
        assert!(block.contains("startx -- :0 vt1"));
    }

    #[test]
    fn test_autologin_dropin_clears_and_replaces_execstart() {
        let ctx = test_ctx(PathBuf::from("/home/kiosk"), AutostartVariant::Profile);
        let dropin = render_autologin_dropin(&ctx);
        assert!(dropin.contains("ExecStart=\n"));
        assert!(dropin.contains("--autologin kiosk"));
    }

    #[test]
    fn test_service_unit_supervision_settings() {
        let ctx = test_ctx(PathBuf::from("/home/kiosk"), AutostartVariant::Service);
        let unit = render_service_unit(&ctx);
        assert!(unit.contains("After=network-online.target graphical.target"));
        assert!(unit.contains("Restart=on-failure"));
        assert!(unit.contains("RestartSec=5"));
        assert!(unit.contains("ExecStart=/usr/bin/startx /home/kiosk/.xinitrc"));
    }

    #[test]
    fn test_upsert_into_empty_profile() {
        let ctx = test_ctx(PathBuf::from("/home/kiosk"), AutostartVariant::Profile);
        let block = render_profile_block(&ctx);
        let result = upsert_profile_block("", &block);
        assert_eq!(result.matches(BLOCK_BEGIN).count(), 1);
    }

    #[test]
    fn test_upsert_preserves_unrelated_content() {
        let ctx = test_ctx(PathBuf::from("/home/kiosk"), AutostartVariant::Profile);
        let block = render_profile_block(&ctx);
        let result = upsert_profile_block("export EDITOR=vim\n", &block);
        assert!(result.starts_with("export EDITOR=vim\n"));
        assert!(result.contains(BLOCK_BEGIN));
    }

    #[test]
    fn test_upsert_twice_does_not_duplicate() {
        let ctx = test_ctx(PathBuf::from("/home/kiosk"), AutostartVariant::Profile);
        let block = render_profile_block(&ctx);
        let once = upsert_profile_block("export EDITOR=vim\n", &block);
        let twice = upsert_profile_block(&once, &block);
        assert_eq!(once, twice);
        assert_eq!(twice.matches(BLOCK_BEGIN).count(), 1);
    }

    #[test]
    fn test_remove_profile_block_keeps_surroundings() {
        let ctx = test_ctx(PathBuf::from("/home/kiosk"), AutostartVariant::Profile);
        let block = render_profile_block(&ctx);
        let content = upsert_profile_block("export A=1\n", &block);
        let removed = remove_profile_block(&content);
        assert!(removed.contains("export A=1"));
        assert!(!removed.contains(BLOCK_BEGIN));
    }

    #[test]
    fn test_remove_profile_block_noop_without_markers() {
        assert_eq!(remove_profile_block("plain profile\n"), "plain profile\n");
    }

    #[test]
    fn test_write_profile_hook_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let ctx = test_ctx(temp.path().to_path_buf(), AutostartVariant::Profile);

        write_profile_hook(&ctx).unwrap();
        let first = fs::read_to_string(login_profile_path(&ctx)).unwrap();
        write_profile_hook(&ctx).unwrap();
        let second = fs::read_to_string(login_profile_path(&ctx)).unwrap();

        assert_eq!(first, second);
        assert_eq!(second.matches(BLOCK_BEGIN).count(), 1);
    }

    #[test]
    fn test_remove_profile_hook_without_profile_is_ok() {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("nohome");
        fs::create_dir(&home).unwrap();
        let ctx = test_ctx(home, AutostartVariant::Service);
        remove_profile_hook(&ctx).unwrap();
    }

    #[test]
    fn test_descriptor_paths_per_variant() {
        let ctx = test_ctx(PathBuf::from("/home/kiosk"), AutostartVariant::Profile);
        let hook = AutostartDescriptor::ProfileHook {
            login_profile: login_profile_path(&ctx),
            autologin_dropin: autologin_dropin_path(&ctx),
        };
        assert_eq!(hook.paths().len(), 2);

        let unit = AutostartDescriptor::ServiceUnit {
            unit: service_unit_path(&ctx),
        };
        assert_eq!(unit.paths().len(), 1);
        assert_eq!(
            unit.paths()[0],
            &PathBuf::from("/etc/systemd/system/helloscreen-kiosk.service")
        );
    }
}
