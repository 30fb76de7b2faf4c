use super::*;
use serial_test::serial;
use std::env;
use std::net::IpAddr;
use std::path::PathBuf;

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_offer_search_env() {
    const VARS: &[&str] = &[
        "OFFER_SEARCH_PORT",
        "OFFER_SEARCH_BIND_ADDR",
        "OFFER_SEARCH_QDRANT_URL",
        "OFFER_SEARCH_COLLECTION",
        "OFFER_SEARCH_MODEL_PATH",
        "OFFER_SEARCH_DEVICE",
        "OFFER_SEARCH_EMBEDDING_DIM",
        "OFFER_SEARCH_FACETS",
        "OFFER_SEARCH_TOP_K",
        "OFFER_SEARCH_NUM_CANDIDATES",
        "OFFER_SEARCH_VECTOR_METRIC",
        "OFFER_SEARCH_SCORE_NORMALIZATION",
        "OFFER_SEARCH_ALLOW_STUB_EMBEDDER",
        "OFFER_SEARCH_RETRY_ATTEMPTS",
        "OFFER_SEARCH_RETRY_BACKOFF_MS",
    ];
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for var in VARS {
        unsafe { env::remove_var(var) };
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.port, 8080);
    assert_eq!(
        config.bind_addr,
        IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1))
    );
    assert_eq!(config.qdrant_url, "http://localhost:6334");
    assert_eq!(config.collection, "offer_search");
    assert!(config.model_path.is_none());
    assert_eq!(config.top_k, 4);
    assert_eq!(config.num_candidates, 1000);
    assert_eq!(config.facets.len(), 3);
    assert_eq!(config.score_normalization, ScoreNormalization::None);
}

#[test]
fn test_socket_addr() {
    let config = Config::default();
    assert_eq!(config.socket_addr(), "127.0.0.1:8080");

    let config = Config {
        port: 3000,
        bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)),
        ..Default::default()
    };
    assert_eq!(config.socket_addr(), "0.0.0.0:3000");
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_offer_search_env();

    let config = Config::from_env().expect("should parse with defaults");

    assert_eq!(config.port, 8080);
    assert_eq!(config.vector_metric, VectorMetric::Cosine);
    assert_eq!(config.device, DevicePreference::Auto);
    assert_eq!(config.retry_attempts, 3);
}

#[test]
#[serial]
fn test_from_env_custom_port() {
    clear_offer_search_env();

    with_env_vars(&[("OFFER_SEARCH_PORT", "3000")], || {
        let config = Config::from_env().expect("should parse");
        assert_eq!(config.port, 3000);
    });
}

#[test]
#[serial]
fn test_from_env_ipv6_bind_addr() {
    clear_offer_search_env();

    with_env_vars(&[("OFFER_SEARCH_BIND_ADDR", "::1")], || {
        let config = Config::from_env().expect("should parse");
        assert_eq!(
            config.bind_addr,
            IpAddr::V6(std::net::Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1))
        );
    });
}

#[test]
#[serial]
fn test_invalid_port_zero() {
    clear_offer_search_env();

    with_env_vars(&[("OFFER_SEARCH_PORT", "0")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { .. }));
        assert!(err.to_string().contains("invalid port"));
    });
}

#[test]
#[serial]
fn test_invalid_port_not_number() {
    clear_offer_search_env();

    with_env_vars(&[("OFFER_SEARCH_PORT", "not_a_port")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::PortParseError { .. }));
    });
}

#[test]
#[serial]
fn test_invalid_bind_addr() {
    clear_offer_search_env();

    with_env_vars(&[("OFFER_SEARCH_BIND_ADDR", "not.an.ip.address")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBindAddr { .. }));
        assert!(err.to_string().contains("failed to parse bind address"));
    });
}

#[test]
#[serial]
fn test_full_config_parse() {
    clear_offer_search_env();

    with_env_vars(
        &[
            ("OFFER_SEARCH_PORT", "9090"),
            ("OFFER_SEARCH_BIND_ADDR", "0.0.0.0"),
            ("OFFER_SEARCH_QDRANT_URL", "http://qdrant.cluster:6334"),
            ("OFFER_SEARCH_COLLECTION", "offers_v2"),
            ("OFFER_SEARCH_MODEL_PATH", "/models/all-mpnet-base-v2"),
            ("OFFER_SEARCH_DEVICE", "cpu"),
            ("OFFER_SEARCH_EMBEDDING_DIM", "384"),
            ("OFFER_SEARCH_TOP_K", "8"),
            ("OFFER_SEARCH_NUM_CANDIDATES", "200"),
            ("OFFER_SEARCH_VECTOR_METRIC", "l2_norm"),
            ("OFFER_SEARCH_SCORE_NORMALIZATION", "minmax"),
            ("OFFER_SEARCH_RETRY_ATTEMPTS", "5"),
            ("OFFER_SEARCH_RETRY_BACKOFF_MS", "10"),
        ],
        || {
            let config = Config::from_env().expect("should parse full config");

            assert_eq!(config.socket_addr(), "0.0.0.0:9090");
            assert_eq!(config.qdrant_url, "http://qdrant.cluster:6334");
            assert_eq!(config.collection, "offers_v2");
            assert_eq!(
                config.model_path,
                Some(PathBuf::from("/models/all-mpnet-base-v2"))
            );
            assert_eq!(config.device, DevicePreference::Cpu);
            assert_eq!(config.embedding_dim, 384);
            assert_eq!(config.top_k, 8);
            assert_eq!(config.num_candidates, 200);
            assert_eq!(config.vector_metric, VectorMetric::Euclid);
            assert_eq!(config.score_normalization, ScoreNormalization::MinMax);
            assert_eq!(config.retry_attempts, 5);
            assert_eq!(config.retry_backoff_ms, 10);
        },
    );
}

#[test]
#[serial]
fn test_from_env_custom_facets() {
    clear_offer_search_env();

    with_env_vars(
        &[(
            "OFFER_SEARCH_FACETS",
            "brand:BRANDVECTOR:OFFER|BRAND, color:COLORVECTOR",
        )],
        || {
            let config = Config::from_env().expect("should parse");

            assert_eq!(config.facets.len(), 2);
            assert_eq!(config.facets[0].payload_fields, vec!["OFFER", "BRAND"]);
            assert_eq!(config.facets[1].name, "color");
            assert_eq!(config.facets[1].vector_field, "COLORVECTOR");
        },
    );
}

#[test]
#[serial]
fn test_from_env_facet_limits_survive_global_top_k() {
    clear_offer_search_env();

    with_env_vars(
        &[
            (
                "OFFER_SEARCH_FACETS",
                "brand:BRANDVECTOR:OFFER|BRAND@10/400,retailer:RETAILERVECTOR",
            ),
            ("OFFER_SEARCH_TOP_K", "3"),
            ("OFFER_SEARCH_NUM_CANDIDATES", "50"),
        ],
        || {
            let config = Config::from_env().expect("should parse");
            assert!(config.validate().is_ok());

            let fusion = config.fusion_config();
            assert_eq!((fusion.facets[0].k, fusion.facets[0].num_candidates), (10, 400));
            assert_eq!((fusion.facets[1].k, fusion.facets[1].num_candidates), (3, 50));
        },
    );
}

#[test]
#[serial]
fn test_from_env_malformed_facet() {
    clear_offer_search_env();

    with_env_vars(&[("OFFER_SEARCH_FACETS", "brand")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                name: "OFFER_SEARCH_FACETS",
                ..
            }
        ));
    });
}

#[test]
#[serial]
fn test_from_env_unknown_normalization() {
    clear_offer_search_env();

    with_env_vars(&[("OFFER_SEARCH_SCORE_NORMALIZATION", "zscore")], || {
        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("OFFER_SEARCH_SCORE_NORMALIZATION"));
    });
}

#[test]
#[serial]
fn test_from_env_unknown_metric() {
    clear_offer_search_env();

    with_env_vars(&[("OFFER_SEARCH_VECTOR_METRIC", "manhattan")], || {
        assert!(Config::from_env().is_err());
    });
}

#[test]
#[serial]
fn test_from_env_invalid_top_k_uses_default() {
    clear_offer_search_env();

    with_env_vars(&[("OFFER_SEARCH_TOP_K", "lots")], || {
        let config = Config::from_env().expect("should parse with fallback");
        assert_eq!(config.top_k, 4);
    });
}

#[test]
#[serial]
fn test_from_env_blank_model_path_is_none() {
    clear_offer_search_env();

    with_env_vars(&[("OFFER_SEARCH_MODEL_PATH", "   ")], || {
        let config = Config::from_env().expect("should parse");
        assert!(config.model_path.is_none());
    });
}

#[test]
fn test_validate_success_with_defaults() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_validate_nonexistent_model_path() {
    let config = Config {
        model_path: Some(PathBuf::from("/nonexistent/path/to/model")),
        ..Default::default()
    };

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::PathNotFound { .. }));
}

#[test]
fn test_validate_model_path_is_file() {
    let config = Config {
        model_path: Some(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml")),
        ..Default::default()
    };

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::NotADirectory { .. }));
}

#[test]
fn test_validate_model_path_directory_ok() {
    let config = Config {
        model_path: Some(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src")),
        ..Default::default()
    };

    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_zero_top_k() {
    let config = Config {
        top_k: 0,
        ..Default::default()
    };

    assert!(config.validate().is_err());
}

#[test]
fn test_validate_zero_embedding_dim() {
    let config = Config {
        embedding_dim: 0,
        ..Default::default()
    };

    assert!(config.validate().is_err());
}

#[test]
fn test_validate_candidates_below_top_k() {
    let config = Config {
        top_k: 10,
        num_candidates: 5,
        ..Default::default()
    };

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("OFFER_SEARCH_NUM_CANDIDATES"));
}

#[test]
fn test_validate_zero_retry_attempts() {
    let config = Config {
        retry_attempts: 0,
        ..Default::default()
    };

    assert!(config.validate().is_err());
}

#[test]
fn test_validate_duplicate_facets() {
    let config = Config {
        facets: vec![FacetSpec::brand(), FacetSpec::brand()],
        ..Default::default()
    };

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("duplicate facet"));
}

#[test]
fn test_fusion_config_carries_settings() {
    let config = Config {
        collection: "offers_v2".to_string(),
        top_k: 6,
        num_candidates: 60,
        score_normalization: ScoreNormalization::MinMax,
        retry_attempts: 2,
        retry_backoff_ms: 25,
        embedding_dim: 384,
        ..Default::default()
    };

    let fusion = config.fusion_config();

    assert_eq!(fusion.collection, "offers_v2");
    assert_eq!(fusion.embedding_dim, 384);
    assert!(fusion.facets.iter().all(|f| f.k == 6 && f.num_candidates == 60));
    assert_eq!(fusion.normalization, ScoreNormalization::MinMax);
    assert_eq!(fusion.retry.max_attempts, 2);
    assert_eq!(fusion.retry.initial_backoff, Duration::from_millis(25));
}

#[test]
fn test_stub_embedder_refused_for_real_index() {
    let config = Config::default();

    let err = config.check_stub_embedder(true, false).unwrap_err();

    assert!(matches!(
        err,
        ConfigError::StubEmbedderNotAllowed { ref url } if url == "http://localhost:6334"
    ));
    assert!(err.to_string().contains("OFFER_SEARCH_MODEL_PATH"));
}

#[test]
fn test_stub_embedder_permitted_combinations() {
    let config = Config::default();
    assert!(config.check_stub_embedder(true, true).is_ok());
    assert!(config.check_stub_embedder(false, false).is_ok());

    let opted_in = Config {
        allow_stub_embedder: true,
        ..Default::default()
    };
    assert!(opted_in.check_stub_embedder(true, false).is_ok());
}

#[test]
#[serial]
fn test_from_env_allow_stub_embedder() {
    clear_offer_search_env();

    with_env_vars(&[("OFFER_SEARCH_ALLOW_STUB_EMBEDDER", "TRUE")], || {
        assert!(Config::from_env().unwrap().allow_stub_embedder);
    });

    with_env_vars(&[("OFFER_SEARCH_ALLOW_STUB_EMBEDDER", "0")], || {
        assert!(!Config::from_env().unwrap().allow_stub_embedder);
    });

    with_env_vars(&[("OFFER_SEARCH_ALLOW_STUB_EMBEDDER", "maybe")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                name: "OFFER_SEARCH_ALLOW_STUB_EMBEDDER",
                ..
            }
        ));
    });
}

#[test]
fn test_error_messages_are_descriptive() {
    let err = ConfigError::InvalidPort {
        value: "0".to_string(),
    };
    assert!(err.to_string().contains("1 and 65535"));

    let err = ConfigError::PathNotFound {
        path: PathBuf::from("/some/path"),
    };
    assert!(err.to_string().contains("/some/path"));

    let err = ConfigError::InvalidValue {
        name: "OFFER_SEARCH_TOP_K",
        reason: "must be at least 1".to_string(),
    };
    assert!(err.to_string().contains("OFFER_SEARCH_TOP_K"));
}
