//! General information about the crate and the emulator.

use monoboy_common::util::capitalize;

use crate::gen::{
    dependencies_map, COMPILATION_DATE, COMPILATION_TIME, COMPILER, COMPILER_VERSION, NAME, VERSION,
};

pub struct Info;

impl Info {
    /// Obtains the name of the emulator.
    pub fn name() -> String {
        capitalize(NAME)
    }

    /// Obtains the name of the emulator in lowercase,
    /// useful for file paths and other situations where
    /// case is relevant.
    pub fn name_lower() -> String {
        String::from(NAME)
    }

    /// Obtains the version of the emulator.
    pub fn version() -> String {
        String::from(VERSION)
    }

    /// Obtains the system this emulator is emulating.
    pub fn system() -> String {
        String::from("Game Boy")
    }

    pub fn compiler() -> String {
        String::from(COMPILER)
    }

    pub fn compiler_version() -> String {
        String::from(COMPILER_VERSION)
    }

    pub fn compilation_date() -> String {
        String::from(COMPILATION_DATE)
    }

    pub fn compilation_time() -> String {
        String::from(COMPILATION_TIME)
    }

    /// Obtains the set of dependencies (and their versions) that
    /// the emulator was built with.
    pub fn dependencies() -> Vec<String> {
        let mut dependencies: Vec<String> = dependencies_map()
            .iter()
            .map(|(name, version)| format!("{}/{}", name, version))
            .collect();
        dependencies.sort();
        dependencies
    }
}

#[cfg(test)]
mod tests {
    use super::Info;

    #[test]
    fn test_basic_info() {
        assert_eq!(Info::name(), "Monoboy");
        assert_eq!(Info::name_lower(), "monoboy");
        assert_eq!(Info::system(), "Game Boy");
        assert_eq!(Info::compiler(), "rustc");
        assert!(!Info::version().is_empty());
    }

    #[test]
    fn test_dependencies() {
        let dependencies = Info::dependencies();
        assert!(dependencies.iter().any(|value| value.starts_with("log/")));
    }
}
