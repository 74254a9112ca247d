//! Program ELF lookup.

use {
    omnipair_harness_error::error::{HarnessError, HarnessResult},
    std::path::{Path, PathBuf},
};

/// Directories searched for `<program_name>.so`, in order: `tests/fixtures`,
/// `BPF_OUT_DIR`, `SBF_OUT_DIR`, then the current working directory.
pub fn default_program_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![PathBuf::from("tests/fixtures")];
    if let Ok(bpf_out_dir) = std::env::var("BPF_OUT_DIR") {
        dirs.push(PathBuf::from(bpf_out_dir));
    }
    if let Ok(sbf_out_dir) = std::env::var("SBF_OUT_DIR") {
        dirs.push(PathBuf::from(sbf_out_dir));
    }
    if let Ok(dir) = std::env::current_dir() {
        dirs.push(dir);
    }
    dirs
}

/// Locate a program's shared object by name in the default search paths.
pub fn find_program_file(program_name: &str) -> HarnessResult<PathBuf> {
    let file_name = format!("{program_name}.so");
    default_program_dirs()
        .into_iter()
        .map(|dir| dir.join(&file_name))
        .find(|candidate| candidate.exists())
        .ok_or(HarnessError::ProgramFileNotFound(file_name))
}

/// Read a file into bytes.
pub fn read_file<P: AsRef<Path>>(path: P) -> HarnessResult<Vec<u8>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(HarnessError::ProgramFileNotFound(path.display().to_string()));
    }
    std::fs::read(path).map_err(|err| HarnessError::FileRead {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}

/// Load a program ELF by name from the default search paths.
pub fn load_program_elf(program_name: &str) -> HarnessResult<Vec<u8>> {
    let path = find_program_file(program_name)?;
    log::debug!("Loading program {} from {}", program_name, path.display());
    read_file(path)
}

#[cfg(test)]
mod tests {
    use {super::*, std::io::Write};

    #[test]
    fn test_read_missing_file() {
        let err = read_file("does/not/exist.so").unwrap_err();
        assert_eq!(
            err,
            HarnessError::ProgramFileNotFound("does/not/exist.so".to_string())
        );
    }

    #[test]
    fn test_read_existing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\x7fELF").unwrap();
        assert_eq!(read_file(file.path()).unwrap(), b"\x7fELF".to_vec());
    }

    #[test]
    #[serial_test::serial]
    fn test_program_found_in_sbf_out_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("finder_test_program.so"), b"\x7fELF").unwrap();

        std::env::set_var("SBF_OUT_DIR", dir.path());
        let found = find_program_file("finder_test_program");
        std::env::remove_var("SBF_OUT_DIR");

        assert_eq!(found.unwrap(), dir.path().join("finder_test_program.so"));
    }

    #[test]
    #[serial_test::serial]
    fn test_unknown_program_name() {
        let err = find_program_file("no_such_program_anywhere").unwrap_err();
        assert_eq!(
            err,
            HarnessError::ProgramFileNotFound("no_such_program_anywhere.so".to_string())
        );
    }
}
