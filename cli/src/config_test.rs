mod tests {
    use std::fs;
    use std::path::PathBuf;

    use anyhow::Result;

    use crate::config::{FileConfig, Overrides, Settings};

    #[test]
    fn test_defaults_without_file_or_flags() {
        let settings = Settings::merge(FileConfig::default(), Overrides::default());
        assert_eq!(settings.namespace, "default");
        assert!(settings.manifests.is_empty());
        assert!(settings.omit.is_empty());
    }

    #[test]
    fn test_flags_override_file() -> Result<()> {
        let file = FileConfig::from_toml_str(
            r#"
namespace = "shop"
manifests = ["cluster.yaml"]
omit = ["import"]
"#,
        )?;
        let flag_manifests = vec![PathBuf::from("other.yaml")];
        let flag_omit = vec!["count_pods".to_string(), "import".to_string()];
        let settings = Settings::merge(
            file.clone(),
            Overrides {
                namespace: Some("staging"),
                manifests: &flag_manifests,
                omit: &flag_omit,
            },
        );
        assert_eq!(settings.namespace, "staging");
        assert_eq!(settings.manifests, flag_manifests);
        assert_eq!(settings.omit, vec!["import".to_string(), "count_pods".to_string()]);

        let from_file = Settings::merge(file, Overrides::default());
        assert_eq!(from_file.namespace, "shop");
        assert_eq!(from_file.manifests, vec![PathBuf::from("cluster.yaml")]);
        Ok(())
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(FileConfig::from_toml_str("namespaces = \"x\"").is_err());
    }

    #[test]
    fn test_manifest_paths_relative_to_config_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("rk.toml");
        fs::write(&path, "manifests = [\"snap.yaml\", \"/abs/snap.yaml\"]\n")?;
        let config = FileConfig::load(&path)?;
        assert_eq!(
            config.manifests,
            vec![dir.path().join("snap.yaml"), PathBuf::from("/abs/snap.yaml")]
        );
        Ok(())
    }

    #[test]
    fn test_explicit_missing_config_fails() {
        let err = FileConfig::discover(Some(std::path::Path::new("/no/such/rk.toml"))).unwrap_err();
        assert!(format!("{:#}", err).contains("reading config"));
    }
}
