#[cfg(test)]
pub mod test {
    use crate::derive::HostInfo;
    use crate::env::MapEnv;
    use crate::settings::Settings;

    pub const INDEX_BASE: &str = "https://download.pytorch.org/whl";

    /// A host with a fixed processor count (`None` simulates a failed query).
    pub struct FixedHost(pub Option<usize>);

    impl HostInfo for FixedHost {
        fn processor_count(&self) -> Option<usize> {
            self.0
        }
    }

    pub fn home_env() -> MapEnv {
        MapEnv::new().with("HOME", "/home/ml")
    }

    pub fn settings() -> Settings {
        Settings::defaults().unwrap()
    }

    /// A config shaped like a real build environment file.
    pub const BUILD_YAML: &str = r#"
conda:
  env_name: te-build
python:
  version: "3.10"
cuda:
  toolkit_version: 12.8.1
  home: /usr/local/cuda-12.8
torch:
  cuda_arch_list: "8.0;9.0"
build:
  max_jobs: ""
transformer_engine:
  repo_url: https://github.com/NVIDIA/TransformerEngine.git
  commit: v2.1
apex:
  repo_url: https://github.com/NVIDIA/apex.git
  commit:
workspace:
  src_dir: $HOME/src
"#;

    #[test]
    fn build_yaml_parses() {
        let doc: serde_yaml::Value = serde_yaml::from_str(BUILD_YAML).unwrap();
        assert!(doc.is_mapping());
    }

    #[test]
    fn default_settings_load() {
        let s = settings();
        assert_eq!(s.loader.separator, "_");
        assert_eq!(s.loader.index_base_url, INDEX_BASE);
        assert_eq!(s.verify.python, "python3");
    }
}
