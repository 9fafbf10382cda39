use facet_testhelpers::test;
use ocl_tree::{parse, view};

const DEPLOYMENT_PROCESS: &str = r#"# Deployment process for the web app
step "Deploy web" {
  name = "Deploy web"
  condition = "Success"

  action "deploy-package" {
    action_type = "Octopus.TentaclePackage"
    environments = ["staging", "production"]
    worker_pool_variable = ""
    properties = {
      Octopus.Action.Package.PackageId = "web"
      "Octopus.Action.RunOnServer" = "true"
    }

    packages "web" {
      acquisition_location = "Server"
      feed = "octopus-server-built-in"
    }
  }
}

step "Run smoke tests" {
  action "smoke" {
    action_type = "Octopus.Script"
    properties = {
      Octopus.Action.Script.ScriptBody = <<-EOT
        curl -f https://example.com/health
        echo "ok"
        EOT
    }
  }
}

default_guided_failure_mode = "EnvironmentDefault"
retries = 3
"#;

#[test]
fn deployment_process() {
    let doc = parse(DEPLOYMENT_PROCESS).unwrap();
    let json = view(&doc).to_interchange();
    insta::assert_snapshot!("deployment_process", serde_json::to_string_pretty(&json).unwrap());
}

#[test]
fn interchange_survives_serialization() {
    let doc = parse(DEPLOYMENT_PROCESS).unwrap();
    let json = view(&doc).to_interchange();
    let text = serde_json::to_string(&json).unwrap();
    let back: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json, back);
}

#[test]
fn interchange_keys_keep_source_order() {
    let doc = parse(DEPLOYMENT_PROCESS).unwrap();
    let json = view(&doc).to_interchange();
    let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["step", "default_guided_failure_mode", "retries"]);

    let step = &json["step"][0];
    let keys: Vec<_> = step.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["name", "condition", "action", "__name", "__labels"]);
}

#[test]
fn independent_conversions_compare_equal() {
    let first = parse(DEPLOYMENT_PROCESS).unwrap();
    let second = parse(DEPLOYMENT_PROCESS).unwrap();
    let a = view(&first).to_interchange();
    let b = view(&second).to_interchange();
    let copy = a.clone();
    assert_eq!(copy, b);

    let changed = DEPLOYMENT_PROCESS.replace("retries = 3", "retries = 4");
    let third = parse(&changed).unwrap();
    assert_ne!(a, view(&third).to_interchange());
}

#[test]
fn floating_attribute_interchange() {
    let doc = parse("count = 1").unwrap();
    let count = view(&doc).index(0).unwrap().as_view().unwrap();
    assert_eq!(count.to_interchange(), serde_json::json!({ "count": 1 }));
}

#[test]
fn heredoc_in_interchange() {
    let doc = parse(DEPLOYMENT_PROCESS).unwrap();
    let json = view(&doc).to_interchange();
    assert_eq!(
        json["step"][1]["action"][0]["properties"]["Octopus.Action.Script.ScriptBody"],
        "curl -f https://example.com/health\necho \"ok\""
    );
}
