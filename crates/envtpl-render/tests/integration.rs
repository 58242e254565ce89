//! Integration tests for envtpl-render.
//!
//! These tests drive the full pipeline (environment snapshot, late expansion,
//! engine, output) through the public API, using mocks for the environment and
//! stdin so results do not depend on the machine running them.

use envtpl_render::{
    render, render_input, ContextBuilder, InputSource, MockEnv, MockStdin, OutputDestination,
    RenderError, TemplateContext,
};

fn context(pairs: &[(&str, &str)]) -> TemplateContext {
    let env = pairs
        .iter()
        .fold(MockEnv::new(), |env, (k, v)| env.with_var(*k, *v));
    ContextBuilder::with_reader(env).build()
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[test]
fn hello_world() {
    let out = render("Hello {[ NAME ]}!", context(&[("NAME", "world")])).unwrap();
    assert_eq!(out, "Hello world!");
}

#[test]
fn filter_and_load_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("a.txt");
    std::fs::write(&file, "A").unwrap();

    let path = file.display().to_string();
    let out = render(
        r#"{[% for f in Filter("^FILE_\d+$").Values() %]}{[ f.LoadFile() ]}{[% endfor %]}"#,
        context(&[("FILE_1", path.as_str())]),
    )
    .unwrap();
    assert_eq!(out, "A");
}

#[test]
fn load_relative_file_from_context_base() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ca.pem"), "CERT").unwrap();

    let base = dir.path().display().to_string();
    let ctx = context(&[("CERT_DIR", base.as_str()), ("CERT", "ca.pem")]);
    assert_eq!(
        render("{[ CERT.LoadRelativeFile(CERT_DIR) ]}", ctx.clone()).unwrap(),
        "CERT"
    );
    assert_eq!(
        render(r#"{[ "ca.pem" | load_relative_file(CERT_DIR) ]}"#, ctx).unwrap(),
        "CERT"
    );
}

// ============================================================================
// Deployment-descriptor style templates
// ============================================================================

#[test]
fn nomad_job_keeps_consumer_syntax() {
    let template = r#"job "{[ JOB ]}" {
  template {
    data = "{{ key \"service/{[ JOB ]}/config\" }}"
  }
  datacenters = [{[% for dc in DATACENTERS.Split(",") %]}{[ dc.ToJSON() ]}{[% if not loop.last %]}, {[% endif %]}{[% endfor %]}]
}
"#;
    let ctx = context(&[("JOB", "api"), ("DATACENTERS", "eu-1,us-2")]);
    let expected = r#"job "api" {
  template {
    data = "{{ key \"service/api/config\" }}"
  }
  datacenters = ["eu-1", "us-2"]
}
"#;
    assert_eq!(render(template, ctx).unwrap(), expected);
}

#[test]
fn late_expansion_sees_final_values() {
    let ctx = context(&[
        ("DATA_DIR", "%ROOT%/data"),
        ("ROOT", "/srv/app"),
        ("LOG_DIR", "%ROOT%/log"),
    ]);
    assert_eq!(
        render("{[ DATA_DIR ]} {[ LOG_DIR ]}", ctx).unwrap(),
        "/srv/app/data /srv/app/log"
    );
}

#[test]
fn values_behave_as_strings() {
    let ctx = context(&[("MODE", "prod"), ("HOSTS", "db1 db2")]);
    let template = r#"{[% if MODE == "prod" %]}live{[% else %]}test{[% endif %]}"#;
    assert_eq!(render(template, ctx.clone()).unwrap(), "live");
    let template = r#"{[% if MODE.String() == "dev" %]}dev{[% else %]}other{[% endif %]}"#;
    assert_eq!(render(template, ctx.clone()).unwrap(), "other");
    let template = r#"{[% if "db2" in HOSTS.Fields() %]}has db2{[% endif %]}"#;
    assert_eq!(render(template, ctx.clone()).unwrap(), "has db2");
    assert_eq!(render("{[ MODE | length ]}", ctx).unwrap(), "4");
}

#[test]
fn optional_variables_render_blank() {
    let template = "cert = [{[ OPTIONAL_CERT.LoadFile() ]}]\n\
                    b64 = [{[ OPTIONAL_TOKEN.ToBase64() ]}]\n\
                    {[% for dc in OPTIONAL_DCS.Split(\",\") %]}dc = [{[ dc ]}]\n{[% endfor %]}";
    let out = render(template, context(&[("UNRELATED", "x")])).unwrap();
    assert_eq!(out, "cert = []\nb64 = []\ndc = []\n");
}

#[test]
fn nested_filters_narrow_further() {
    let ctx = context(&[("APP_DB_HOST", "h"), ("APP_DB_PORT", "1"), ("APP_NAME", "n")]);
    let template = r#"{[ Filter("^APP_").Filter("_DB_").Keys() | join(",") ]}"#;
    assert_eq!(render(template, ctx).unwrap(), "APP_DB_HOST,APP_DB_PORT");
}

#[test]
fn builtin_filters_apply_to_values() {
    let ctx = context(&[("NAME", "  World  ")]);
    assert_eq!(
        render("{[ NAME | trim | upper ]}", ctx.clone()).unwrap(),
        "WORLD"
    );
    assert_eq!(render("{[ MISSING | default('x') ]}", ctx).unwrap(), "x");
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn unclosed_block_is_parse_error() {
    let err = render("{[% for x in A %]}", context(&[])).unwrap_err();
    assert!(matches!(err, RenderError::Parse(_)));
}

#[test]
fn bad_regex_in_helper_is_render_error() {
    let err = render(r#"{[ regex_match("(", "x") ]}"#, context(&[])).unwrap_err();
    assert!(matches!(err, RenderError::Render(_)));
}

#[test]
fn bad_filter_pattern_keeps_rendering() {
    let out = render(r#"a{[ Filter("[") | length ]}b"#, context(&[("A", "1")])).unwrap();
    assert_eq!(out, "a0b");
}

// ============================================================================
// Input and output
// ============================================================================

#[test]
fn stdin_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("job.nomad");

    let rendered = render_input(
        &InputSource::Stdin,
        &MockStdin::piped("name = {[ NAME ]}\n"),
        context(&[("NAME", "api")]),
    )
    .unwrap();
    OutputDestination::File(out_path.clone())
        .write_text(&rendered)
        .unwrap();

    assert_eq!(std::fs::read_to_string(out_path).unwrap(), "name = api\n");
}

#[test]
fn output_is_byte_exact() {
    let template = "line1\r\n\ttabbed {[ V ]}\n\n";
    let out = render(template, context(&[("V", "<&>")])).unwrap();
    assert_eq!(out, "line1\r\n\ttabbed <&>\n\n");
}
