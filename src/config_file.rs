//! Generic config file loader

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use serde::de::DeserializeOwned;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigBackend {
    Json5,
    Yaml,
    Hcl,
}

impl ConfigBackend {
    pub fn name(self) -> &'static str {
        match self {
            ConfigBackend::Json5 => "JSON5",
            ConfigBackend::Yaml => "YAML",
            ConfigBackend::Hcl => "HCL",
        }
    }

    /// Decode `s`, which is in this backend's format.
    pub fn parse_str<T: DeserializeOwned>(self, s: &str) -> Result<T> {
        let res: Result<T> = match self {
            ConfigBackend::Json5 => serde_json5::from_str(s).map_err(anyhow::Error::from),
            ConfigBackend::Yaml => serde_yml::from_str(s).map_err(anyhow::Error::from),
            ConfigBackend::Hcl => hcl::from_str(s).map_err(anyhow::Error::from),
        };
        res.with_context(|| anyhow!("decoding {}", self.name()))
    }

    pub fn load_config_file<T: DeserializeOwned>(self, path: &Path) -> Result<T> {
        let s = std::fs::read_to_string(path)
            .with_context(|| anyhow!("loading config file from {path:?}"))?;
        self.parse_str(&s)
            .with_context(|| anyhow!("in config file {path:?}"))
    }
}

pub const FILE_EXTENSIONS: &[(&str, ConfigBackend)] = &[
    ("json5", ConfigBackend::Json5),
    ("json", ConfigBackend::Json5),
    ("yml", ConfigBackend::Yaml),
    ("yaml", ConfigBackend::Yaml),
    ("hcl", ConfigBackend::Hcl),
];

pub fn backend_from_path(path: &Path) -> Result<ConfigBackend> {
    let Some(ext) = path.extension() else {
        bail!(
            "given file path does not have an extension \
             for determining the file type: {path:?}"
        )
    };
    let Some(ext) = ext.to_str() else {
        bail!("given file path does have an extension that is not unicode: {path:?}")
    };
    match FILE_EXTENSIONS.iter().find(|(e, _b)| *e == ext) {
        Some((_, backend)) => Ok(*backend),
        None => bail!("given file path does have an unknown extension {ext:?}: {path:?}"),
    }
}

/// `path` with ".`extension`" appended to its file name; None if the
/// path has no file name.
fn add_extension(path: &Path, extension: &str) -> Option<PathBuf> {
    let mut file_name = path.file_name()?.to_owned();
    file_name.push(".");
    file_name.push(extension);
    Some(path.with_file_name(file_name))
}

pub trait LoadConfigFile: DeserializeOwned {
    /// Each of `FILE_EXTENSIONS` will be appended and tried.
    fn default_config_path_without_suffix() -> Result<Option<PathBuf>>;

    /// If `path` is given, the file must exist or an error is
    /// returned. Otherwise, a default location is checked
    /// (`default_config_path_without_suffix`) and if a file with one
    /// of the fitting file name extensions exists, it is loaded,
    /// otherwise `or_else` is called with a message mentioning what
    /// was tried; it can issue an error or generate a default config
    /// value.
    fn load_config<P: AsRef<Path>>(
        path: Option<P>,
        or_else: impl FnOnce(String) -> Result<Self>,
    ) -> Result<Self> {
        if let Some(path) = path {
            let path = path.as_ref();
            let backend = backend_from_path(path)?;
            return backend.load_config_file(path);
        }
        let Some(base) = Self::default_config_path_without_suffix()? else {
            return or_else(
                "no path was given and there is no default \
                 config location for this type"
                    .into(),
            );
        };
        let mut tried = Vec::new();
        let mut found = Vec::new();
        for (extension, backend) in FILE_EXTENSIONS {
            let path = add_extension(&base, extension)
                .ok_or_else(|| anyhow!("path is missing a file name: {base:?}"))?;
            if path.exists() {
                found.push((path.clone(), *backend));
            }
            tried.push(path);
        }
        match found.as_slice() {
            [] => or_else(format!("tried the default paths: {tried:?}")),
            [(path, backend)] => backend.load_config_file(path),
            _ => {
                let paths: Vec<_> = found.iter().map(|(path, _)| path).collect();
                bail!("multiple config file paths found, leading to ambiguity: {paths:?}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn t_backend_from_path() -> Result<()> {
        assert_eq!(backend_from_path(Path::new("a/b.json5"))?, ConfigBackend::Json5);
        assert_eq!(backend_from_path(Path::new("b.json"))?, ConfigBackend::Json5);
        assert_eq!(backend_from_path(Path::new("b.yml"))?, ConfigBackend::Yaml);
        assert_eq!(backend_from_path(Path::new("b.hcl"))?, ConfigBackend::Hcl);
        assert!(backend_from_path(Path::new("b.toml")).is_err());
        assert!(backend_from_path(Path::new("b")).is_err());
        Ok(())
    }

    #[test]
    fn t_add_extension() {
        assert_eq!(
            add_extension(Path::new("/home/x/.mock-datasets"), "yml"),
            Some(PathBuf::from("/home/x/.mock-datasets.yml"))
        );
        assert_eq!(add_extension(Path::new("/"), "yml"), None);
    }

    #[test]
    fn t_parse_str() -> Result<()> {
        let from_json5: BTreeMap<String, i64> =
            ConfigBackend::Json5.parse_str("{ a: 1, /* c */ b: 2, }")?;
        let from_yaml: BTreeMap<String, i64> = ConfigBackend::Yaml.parse_str("a: 1\nb: 2\n")?;
        let from_hcl: BTreeMap<String, i64> = ConfigBackend::Hcl.parse_str("a = 1\nb = 2\n")?;
        assert_eq!(from_json5, from_yaml);
        assert_eq!(from_json5, from_hcl);
        assert!(ConfigBackend::Json5
            .parse_str::<BTreeMap<String, i64>>("{ a: ")
            .is_err());
        Ok(())
    }
}
