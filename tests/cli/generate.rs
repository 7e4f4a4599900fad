//! Tests for `mimir-provision generate`.

use crate::support::*;
use mimir_provision::core::token::{decode_token, Role};

#[test]
fn test_generate_writes_every_output() {
    let t = Test::with_templates();

    let output = t.generate(&[]);
    assert_success(&output);
    assert_stdout_contains(&output, "wrote");

    for rel in [ENV_OUTPUT, NODE_TOKEN_FILE, NODE_ADMIN_TOKEN_FILE, CONDUIT_OUTPUT] {
        let content = t.read(rel);
        assert!(!content.is_empty(), "{} should not be empty", rel);
    }
}

#[cfg(unix)]
#[test]
fn test_outputs_are_owner_only() {
    let t = Test::with_templates();
    assert_success(&t.generate(&[]));

    for rel in [ENV_OUTPUT, NODE_TOKEN_FILE, NODE_ADMIN_TOKEN_FILE, CONDUIT_OUTPUT] {
        assert_owner_only(&t.path(rel));
    }
}

#[test]
fn test_node_token_line_matches_token_file() {
    let t = Test::with(ENV_TEMPLATE, CONDUIT_TEMPLATE);
    assert_success(&t.generate(&[]));

    let token = t.read(NODE_TOKEN_FILE);
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

    let env = t.read(ENV_OUTPUT);
    assert!(env.lines().any(|l| l == format!("NODE_TOKEN={}", token)));
    assert_eq!(t.env_vars()["NODE_ADMIN_TOKEN"], t.read(NODE_ADMIN_TOKEN_FILE));
    assert_ne!(token, t.read(NODE_ADMIN_TOKEN_FILE));
}

#[test]
fn test_no_placeholders_remain() {
    let t = Test::with_templates();
    assert_success(&t.generate(&[]));

    let env = t.read(ENV_OUTPUT);
    let conduit = t.read(CONDUIT_OUTPUT);
    for text in [&env, &conduit] {
        assert!(!text.contains("your-super-secret"));
        assert!(!text.contains("this-is-a-secure"));
        assert!(!text.contains("generated-by-mimir-provision"));
        assert!(!text.contains("${"));
    }
}

#[test]
fn test_secrets_have_expected_sizes() {
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    let t = Test::with(ENV_TEMPLATE, CONDUIT_TEMPLATE);
    assert_success(&t.generate(&[]));
    let vars = t.env_vars();

    for (key, len) in [
        ("POSTGRES_PASSWORD", 32),
        ("JWT_SECRET", 32),
        ("DASHBOARD_PASSWORD", 24),
        ("LOGFLARE_API_KEY", 16),
    ] {
        let decoded = STANDARD.decode(&vars[key]).unwrap();
        assert_eq!(decoded.len(), len, "{} decoded length", key);
    }
}

#[test]
fn test_tokens_verify_against_jwt_secret() {
    let t = Test::with(ENV_TEMPLATE, CONDUIT_TEMPLATE);
    assert_success(&t.generate(&[]));
    let vars = t.env_vars();

    let anon = decode_token(&vars["ANON_KEY"], &vars["JWT_SECRET"]).unwrap();
    assert_eq!(anon.role, Role::Anon);
    assert_eq!(anon.iss, "supabase");
    assert_eq!(anon.exp - anon.iat, 10 * 365 * 24 * 60 * 60);

    let service = decode_token(&vars["SERVICE_ROLE_KEY"], &vars["JWT_SECRET"]).unwrap();
    assert_eq!(service.role, Role::ServiceRole);
}

#[test]
fn test_conduit_uses_generated_values() {
    let t = Test::with(ENV_TEMPLATE, CONDUIT_TEMPLATE);
    assert_success(&t.generate(&[]));
    let vars = t.env_vars();
    let conduit = t.read(CONDUIT_OUTPUT);

    assert!(conduit.contains(&format!("token: \"{}\"", vars["NODE_TOKEN"])));
    assert!(conduit.contains(&format!(
        "host=db password={} dbname=postgres",
        vars["POSTGRES_PASSWORD"]
    )));
    serde_yaml::from_str::<serde_yaml::Value>(&conduit).unwrap();
}

#[test]
fn test_rerun_keeps_structure_but_changes_values() {
    let t = Test::with_templates();
    assert_success(&t.generate(&[]));
    let first = t.env_vars();
    let first_token = t.read(NODE_TOKEN_FILE);

    assert_success(&t.generate(&[]));
    let second = t.env_vars();

    let keys = |m: &std::collections::BTreeMap<String, String>| m.keys().cloned().collect::<Vec<_>>();
    assert_eq!(keys(&first), keys(&second));

    for key in [
        "POSTGRES_PASSWORD",
        "JWT_SECRET",
        "DASHBOARD_PASSWORD",
        "LOGFLARE_API_KEY",
        "NODE_TOKEN",
        "NODE_ADMIN_TOKEN",
        "ANON_KEY",
        "SERVICE_ROLE_KEY",
    ] {
        assert_ne!(first[key], second[key], "{} should change between runs", key);
    }
    assert_eq!(first["DASHBOARD_USERNAME"], second["DASHBOARD_USERNAME"]);
    assert_ne!(first_token, t.read(NODE_TOKEN_FILE));
}

#[test]
fn test_rerun_warns_about_invalidated_keys() {
    let t = Test::with_templates();
    assert_success(&t.generate(&[]));

    let output = t.generate(&[]);
    assert_success(&output);
    assert_stderr_contains(&output, "NEW secrets");
}

#[test]
fn test_missing_env_template_writes_nothing() {
    let t = Test::new();
    t.write("templates/conduit.yml.template", CONDUIT_TEMPLATE);

    let output = t.generate(&[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "template not found");

    assert!(!t.path(ENV_OUTPUT).exists());
    assert!(!t.path("algod-data").exists());
    assert!(!t.path(CONDUIT_OUTPUT).exists());
}

#[test]
fn test_missing_conduit_template_writes_nothing() {
    let t = Test::new();
    t.write("templates/.env.template", ENV_TEMPLATE);

    let output = t.generate(&[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "conduit.yml.template");

    assert!(!t.path("supabase").exists());
    assert!(!t.path("algod-data").exists());
}

#[test]
fn test_env_template_without_anon_key_writes_nothing() {
    let t = Test::with(
        &ENV_TEMPLATE.replace("ANON_KEY=placeholder\n", ""),
        CONDUIT_TEMPLATE,
    );

    let output = t.generate(&[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "ANON_KEY");

    assert!(!t.path(ENV_OUTPUT).exists());
    assert!(!t.path("algod-data").exists());
    assert!(!t.path(CONDUIT_OUTPUT).exists());
}

#[test]
fn test_no_conduit_skips_its_template() {
    let t = Test::new();
    t.write("templates/.env.template", ENV_TEMPLATE);

    let output = t.generate(&["--no-conduit"]);
    assert_success(&output);
    assert!(t.path(ENV_OUTPUT).exists());
    assert!(t.path(NODE_TOKEN_FILE).exists());
    assert!(!t.path(CONDUIT_OUTPUT).exists());
}

#[test]
fn test_output_selection_flags() {
    let t = Test::with(ENV_TEMPLATE, CONDUIT_TEMPLATE);

    let output = t.generate(&["--no-env", "--no-conduit"]);
    assert_success(&output);
    assert!(!t.path(ENV_OUTPUT).exists());
    assert!(t.path(NODE_TOKEN_FILE).exists());
    assert!(t.path(NODE_ADMIN_TOKEN_FILE).exists());
}

#[test]
fn test_all_outputs_disabled_fails() {
    let t = Test::with(ENV_TEMPLATE, CONDUIT_TEMPLATE);
    let output = t.generate(&["--no-env", "--no-node-tokens", "--no-conduit"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "nothing to generate");
}

#[test]
fn test_custom_paths() {
    let t = Test::new();
    t.write("tpl/.env.template", ENV_TEMPLATE);
    t.write("tpl/conduit.yml.template", CONDUIT_TEMPLATE);

    let output = t.generate(&[
        "--templates",
        "tpl",
        "--env-out",
        "out/.env",
        "--node-data",
        "node",
        "--conduit-out",
        "out/conduit.yml",
    ]);
    assert_success(&output);
    assert!(t.path("out/.env").exists());
    assert!(t.path("node/algod.token").exists());
    assert!(t.path("out/conduit.yml").exists());
}

#[test]
fn test_root_flag() {
    let t = Test::new();
    t.write("stack/templates/.env.template", ENV_TEMPLATE);
    t.write("stack/templates/conduit.yml.template", CONDUIT_TEMPLATE);

    assert_success(&t.generate(&["--root", "stack"]));
    assert!(t.path("stack/supabase/docker/.env").exists());
    assert!(t.path("stack/algod-data/algod.token").exists());
}

#[test]
fn test_secret_values_hidden_by_default() {
    let t = Test::with(ENV_TEMPLATE, CONDUIT_TEMPLATE);
    let output = t.generate(&[]);
    assert_success(&output);

    let vars = t.env_vars();
    assert_output_excludes(&output, &vars["JWT_SECRET"]);
    assert_output_excludes(&output, &vars["POSTGRES_PASSWORD"]);
    assert_output_excludes(&output, &vars["NODE_TOKEN"]);
    assert_stdout_contains(&output, "--show-secrets");
}

#[test]
fn test_show_secrets_prints_values() {
    let t = Test::with(ENV_TEMPLATE, CONDUIT_TEMPLATE);
    let output = t.generate(&["--show-secrets"]);
    assert_success(&output);

    let vars = t.env_vars();
    assert_stdout_contains(&output, &vars["JWT_SECRET"]);
    assert_stdout_contains(&output, &vars["SERVICE_ROLE_KEY"]);
}

#[test]
fn test_json_report() {
    let t = Test::with(ENV_TEMPLATE, CONDUIT_TEMPLATE);
    let output = t.generate(&["--json"]);
    assert_success(&output);

    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["files"].as_array().unwrap().len(), 4);
    let secrets = report["secrets"].as_array().unwrap();
    assert!(secrets.iter().all(|s| s.get("value").is_none()));
    assert!(secrets.iter().any(|s| s["key"] == "ANON_KEY"));
}

#[test]
fn test_prime_url_appends_section() {
    let t = Test::with(ENV_TEMPLATE, CONDUIT_TEMPLATE);
    assert_success(&t.generate(&["--prime-url", "https://mimir.voi.sh"]));

    let env = t.read(ENV_OUTPUT);
    assert!(env.contains("# Prime Mimir Instance"));
    assert_eq!(t.env_vars()["PRIME_SUPABASE_URL"], "https://mimir.voi.sh");
}

#[test]
fn test_unresolved_placeholder_fails_by_default() {
    let t = Test::with(ENV_TEMPLATE, CONDUIT_TEMPLATE_UNRESOLVED);

    let output = t.generate(&[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "${NODE_URL}");
    assert_stderr_contains(&output, "--allow-unresolved");
    assert!(!t.path(ENV_OUTPUT).exists());
}

#[test]
fn test_allow_unresolved_passes_through() {
    let t = Test::with(ENV_TEMPLATE, CONDUIT_TEMPLATE_UNRESOLVED);

    assert_success(&t.generate(&["--allow-unresolved"]));
    assert!(t.read(CONDUIT_OUTPUT).contains("${NODE_URL}"));
}

#[test]
fn test_config_file_is_honored() {
    let t = Test::with(ENV_TEMPLATE, CONDUIT_TEMPLATE);
    t.write(
        "mimir-provision.toml",
        r#"
[secrets]
dashboard_password = 48

[conduit]
postgres_host = "supabase-db"
"#,
    );

    assert_success(&t.generate(&[]));
    assert!(t.read(CONDUIT_OUTPUT).contains("host=supabase-db "));

    use base64::{engine::general_purpose::STANDARD, Engine as _};
    let decoded = STANDARD.decode(&t.env_vars()["DASHBOARD_PASSWORD"]).unwrap();
    assert_eq!(decoded.len(), 48);
}

#[test]
fn test_invalid_config_file_fails() {
    let t = Test::with(ENV_TEMPLATE, CONDUIT_TEMPLATE);
    t.write("mimir-provision.toml", "[secrets]\njwt_secret = 4\n");

    let output = t.generate(&[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "jwt_secret");
}
