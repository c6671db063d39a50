use crate::asf::EARTHDATA_HOST;
use crate::config::Login;
use anyhow::{anyhow, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub fn netrc_entry(login: &Login) -> String {
    format!(
        "machine {}\n    login {}\n    password {}\n",
        EARTHDATA_HOST, login.username, login.password
    )
}

pub fn default_netrc_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(anyhow!("Unable to locate the home directory"))?;
    Ok(home.join(".netrc"))
}

/// Writes the Earthdata entry to `path`, copying an existing file to `<path>.backup` first.
/// Returns the backup path if one was made.
pub fn write_netrc(path: &Path, login: &Login) -> Result<Option<PathBuf>> {
    let mut backup = None;
    if path.exists() {
        let mut name = path.as_os_str().to_owned();
        name.push(".backup");
        let backup_path = PathBuf::from(name);
        fs::copy(path, &backup_path)?;
        log::warn!(
            "Existing {} found, backup written to {}",
            path.display(),
            backup_path.display()
        );
        backup = Some(backup_path);
    }

    fs::write(path, netrc_entry(login))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    log::info!("Wrote {}", path.display());
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login() -> Login {
        Login {
            username: "jdoe".to_string(),
            password: "hunter2".to_string(),
        }
    }

    #[test]
    fn test_netrc_entry() {
        assert_eq!(
            netrc_entry(&login()),
            "machine urs.earthdata.nasa.gov\n    login jdoe\n    password hunter2\n"
        );
    }

    #[test]
    fn test_write_netrc_with_backup() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(".netrc");

        assert_eq!(write_netrc(&path, &login()).unwrap(), None);

        fs::write(&path, "machine example.com login a password b\n").unwrap();
        let backup = write_netrc(&path, &login()).unwrap().unwrap();
        assert_eq!(backup, tmp.path().join(".netrc.backup"));
        assert_eq!(
            fs::read_to_string(&backup).unwrap(),
            "machine example.com login a password b\n"
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), netrc_entry(&login()));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
