//! Integration tests for config

#[cfg(test)]
mod tests {
    use dlsim_config::*;
    use dlsim_types::{ColorChoice, Mode, OutputFormat, VictimPolicyKind};
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_VARS: [&str; 7] = [
        "DLSIM_MODE",
        "DLSIM_VICTIM_POLICY",
        "DLSIM_PROCESSES",
        "DLSIM_RESOURCES",
        "DLSIM_SEED",
        "DLSIM_OUTPUT",
        "DLSIM_COLOR",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[general]
default_output = "plain"
color = "never"

[simulation]
processes = 8
resources = 4
min_capacity = 1
max_capacity = 6
mode = "avoidance"
victim_policy = "lowest_holdings"
seed = 42

[autopilot]
request_probability = 0.5
steps = 100
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.general.default_output, OutputFormat::Plain);
        assert_eq!(config.general.color, ColorChoice::Never);
        assert_eq!(config.simulation.processes, 8);
        assert_eq!(config.simulation.capacity_range(), 1..=6);
        assert_eq!(config.simulation.mode, Mode::Avoidance);
        assert_eq!(config.simulation.victim_policy, VictimPolicyKind::LowestHoldings);
        assert_eq!(config.simulation.seed, Some(42));
        assert!((config.autopilot.request_probability - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.autopilot.max_request_units, 2);
        assert_eq!(config.autopilot.steps, 100);
    }

    #[tokio::test]
    async fn test_inverted_capacity_range_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[simulation]
min_capacity = 5
max_capacity = 2
        "#
        )
        .unwrap();

        assert!(Config::load_from_file(temp_file.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let err = Config::load_from_file(std::path::Path::new("/nonexistent/dlsim.toml"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            dlsim_errors::Error::Config(dlsim_errors::ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn test_entity_counts_are_clamped() {
        let sim = SimulationConfig {
            processes: 0,
            resources: 500,
            ..SimulationConfig::default()
        };
        assert_eq!(sim.clamped_processes(), 1);
        assert_eq!(sim.clamped_resources(), 100);
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("DLSIM_MODE", "prevention");
        std::env::set_var("DLSIM_PROCESSES", "12");
        std::env::set_var("DLSIM_SEED", "7");
        std::env::set_var("DLSIM_OUTPUT", "json");
        std::env::set_var("DLSIM_VICTIM_POLICY", "lowest-holdings");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert_eq!(config.simulation.mode, Mode::Prevention);
        assert_eq!(config.simulation.processes, 12);
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.general.default_output, OutputFormat::Json);
        assert_eq!(
            config.simulation.victim_policy,
            VictimPolicyKind::LowestHoldings
        );

        clear_env();
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("DLSIM_MODE", "optimistic");

        let mut config = Config::default();
        assert!(config.merge_env().is_err());

        clear_env();
    }

    #[test]
    fn test_probability_out_of_range() {
        let mut config = Config::default();
        config.autopilot.request_probability = 1.5;
        assert!(config.validate().is_err());
    }
}
