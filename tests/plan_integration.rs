//! End-to-end plan construction tests
//!
//! Builds full stack plans from resolved settings and checks the wiring:
//! derived ports, the conditional DNS chain and its ordering, environment
//! variables, volume mounts, and password persistence across builds.

use anyhow::Result;
use rusqlite::Connection;

use strapi_stack::config::{RawSettings, StackSettings};
use strapi_stack::resources::ResourceSpec;
use strapi_stack::stack::{self, DnsSetup, StackPlan};
use strapi_stack::{secret, state};

const TEST_PASSWORD: &str = "aB3dE6gH9jK2mN5p";

fn settings(raw: RawSettings) -> StackSettings {
    StackSettings::resolve(raw).unwrap()
}

fn build(settings: &StackSettings) -> StackPlan {
    stack::build("test", settings, TEST_PASSWORD).unwrap()
}

fn custom_domain_settings() -> StackSettings {
    settings(RawSettings {
        domain: Some("example.com".to_string()),
        subdomain: Some("app".to_string()),
        ..Default::default()
    })
}

#[test]
fn db_security_group_ingress_matches_engine_port() {
    for (db_type, port) in [("mysql", 3306), ("postgres", 5432)] {
        let s = settings(RawSettings {
            db_type: Some(db_type.to_string()),
            ..Default::default()
        });
        assert_eq!(s.db_port(), port);

        let plan = build(&s);
        let node = plan.graph.node(plan.resources.security_groups.db);
        let ResourceSpec::SecurityGroup(sg) = &node.spec else {
            panic!("db-sg is not a security group");
        };
        assert_eq!(sg.ingress.len(), 1);
        assert_eq!(sg.ingress[0].from_port, port);
        assert_eq!(sg.ingress[0].to_port, port);

        let ResourceSpec::DbInstance(db) = &plan.graph.node(plan.resources.db).spec else {
            panic!("db is not a database instance");
        };
        assert_eq!(db.engine, db_type);
    }
}

#[test]
fn dns_chain_needs_both_domain_and_subdomain() {
    for raw in [
        RawSettings {
            domain: Some("example.com".to_string()),
            ..Default::default()
        },
        RawSettings {
            subdomain: Some("app".to_string()),
            ..Default::default()
        },
        RawSettings::default(),
    ] {
        let plan = build(&settings(raw));
        assert!(matches!(plan.dns, DnsSetup::PlainHttp));
        assert!(plan.graph.get("certificate").is_none());
        assert!(plan.graph.get("https-listener").is_none());
        assert_eq!(plan.url().to_engine_string(), "http://${alb.dns_name}");
    }
}

#[test]
fn custom_domain_url_is_exact() {
    let plan = build(&custom_domain_settings());
    assert_eq!(plan.url().to_engine_string(), "https://app.example.com");
}

#[test]
fn dns_chain_ordering_is_strict() {
    let plan = build(&custom_domain_settings());
    let chain = plan.dns.chain().expect("chain must exist");
    let g = &plan.graph;

    // certificate -> validation record -> validation
    assert!(g.requires(chain.validation_record, chain.certificate));
    assert!(g.requires(chain.validation_record, chain.zone));
    assert!(g.requires(chain.validation, chain.validation_record));
    assert!(g.requires(chain.validation, chain.certificate));

    // A-record follows the certificate
    assert!(g.requires(chain.alias_record, chain.certificate));
    assert!(g.requires(chain.alias_record, plan.resources.alb));

    // listener follows both the validation and the A-record
    assert!(g.requires(chain.https_listener, chain.validation));
    assert!(g.requires(chain.https_listener, chain.alias_record));
    assert!(g.requires(chain.https_listener, chain.certificate));

    // the listener must not be creatable before either gate
    let order = g.topo_order().unwrap();
    let pos = |id| order.iter().position(|&x| x == id).unwrap();
    assert!(pos(chain.https_listener) > pos(chain.validation));
    assert!(pos(chain.https_listener) > pos(chain.alias_record));
}

#[test]
fn service_wiring_is_complete() {
    let plan = build(&StackSettings::default());
    let g = &plan.graph;
    let r = &plan.resources;

    // data-flow edges
    assert!(g.requires(r.service, r.db));
    assert!(g.requires(r.service, r.image));
    assert!(g.requires(r.service, r.alb));
    assert!(g.requires(r.service, r.cluster));
    assert!(g.requires(r.service, r.vpc));
    assert!(g.requires(r.image, r.repository));
    assert!(g.requires(r.db, r.db_subnet_group));

    // both mount targets gate the volume attachment
    for mt in r.storage.mount_targets {
        assert!(g.requires(r.service, mt));
        assert!(g.requires(mt, r.storage.file_system));
    }

    // every security group sits inside the VPC
    for sg in [
        r.security_groups.alb,
        r.security_groups.cluster,
        r.security_groups.db,
        r.security_groups.fs,
    ] {
        assert!(g.requires(sg, r.vpc));
    }
}

#[test]
fn service_environment_has_exact_key_set() {
    let plan = build(&settings(RawSettings {
        db_type: Some("mysql".to_string()),
        ..Default::default()
    }));
    let ResourceSpec::Service(service) = &plan.graph.node(plan.resources.service).spec else {
        panic!("service is not a service spec");
    };

    let names: Vec<&str> = service
        .container
        .environment
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "DATABASE_CLIENT",
            "DATABASE_HOST",
            "DATABASE_PORT",
            "DATABASE_NAME",
            "DATABASE_USERNAME",
            "DATABASE_PASSWORD",
            "DOCKER_DEFAULT_PLATFORM",
        ]
    );

    let get = |name: &str| {
        service
            .container
            .environment
            .iter()
            .find(|e| e.name == name)
            .unwrap()
            .value
            .to_engine_string()
    };
    assert_eq!(get("DATABASE_CLIENT"), "mysql");
    assert_eq!(get("DATABASE_HOST"), "${db.address}");
    assert_eq!(get("DATABASE_PORT"), "${db.port}");
    assert_eq!(get("DATABASE_PASSWORD"), "${db.password}");
    assert_eq!(get("DOCKER_DEFAULT_PLATFORM"), "linux/amd64");
}

#[test]
fn uploads_mount_path_follows_config() {
    let plan = build(&settings(RawSettings {
        app_uploads_path: Some("media".to_string()),
        ..Default::default()
    }));
    let ResourceSpec::Service(service) = &plan.graph.node(plan.resources.service).spec else {
        panic!("service is not a service spec");
    };
    assert_eq!(service.container.mount_points.len(), 1);
    assert_eq!(
        service.container.mount_points[0].container_path,
        "/opt/app/media"
    );
    assert_eq!(service.volumes.len(), 1);
    assert!(service.volumes[0].transit_encryption);
}

#[test]
fn tags_apply_everywhere_or_nowhere() -> Result<()> {
    let untagged = build(&StackSettings::default());
    let json: serde_json::Value = serde_json::from_str(&strapi_stack::render::export_json(
        &untagged,
    )?)?;
    for resource in json["resources"].as_array().unwrap() {
        assert!(
            resource["spec"].get("tags").is_none(),
            "unexpected tags on {}",
            resource["name"]
        );
    }

    let mut raw = RawSettings {
        domain: Some("example.com".to_string()),
        subdomain: Some("app".to_string()),
        ..Default::default()
    };
    raw.tags = Some(
        [("team".to_string(), "web".to_string())]
            .into_iter()
            .collect(),
    );
    let tagged = build(&settings(raw));
    let json: serde_json::Value =
        serde_json::from_str(&strapi_stack::render::export_json(&tagged)?)?;

    // mount targets, records, lookups and the validation wait take no tags
    let untaggable = [
        "fs-1",
        "fs-2",
        "service-image",
        "zone",
        "certificate-validation-record",
        "certificate-validation",
        "alb-alias",
    ];
    for resource in json["resources"].as_array().unwrap() {
        let name = resource["name"].as_str().unwrap();
        if untaggable.contains(&name) {
            assert!(resource["spec"].get("tags").is_none(), "tags on {name}");
        } else {
            assert_eq!(
                resource["spec"]["tags"]["team"], "web",
                "missing tags on {name}"
            );
        }
    }
    Ok(())
}

#[test]
fn generated_password_is_stable_across_builds() -> Result<()> {
    let conn = Connection::open_in_memory()?;
    state::init_schema(&conn)?;

    let s = StackSettings::default();
    let first = secret::resolve_db_password(&conn, "dev", s.db_password.as_deref())?;
    let second = secret::resolve_db_password(&conn, "dev", s.db_password.as_deref())?;
    assert_eq!(first, second);
    assert_eq!(first.len(), 16);
    assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));

    // both plans carry the same secret
    let plan_a = stack::build("dev", &s, &first)?;
    let plan_b = stack::build("dev", &s, &second)?;
    let password_of = |plan: &StackPlan| {
        let ResourceSpec::DbInstance(db) = &plan.graph.node(plan.resources.db).spec else {
            panic!("db is not a database instance");
        };
        db.password.to_engine_string()
    };
    assert_eq!(password_of(&plan_a), password_of(&plan_b));
    Ok(())
}

#[test]
fn persisted_password_survives_reopen() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("state.db");

    let first = {
        let conn = Connection::open(&path)?;
        state::init_schema(&conn)?;
        secret::resolve_db_password(&conn, "dev", None)?
    };
    let second = {
        let conn = Connection::open(&path)?;
        state::init_schema(&conn)?;
        secret::resolve_db_password(&conn, "dev", None)?
    };
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn plan_resource_inventory() {
    // 15 resources without a custom domain, 21 with the DNS chain
    let plain = build(&StackSettings::default());
    assert_eq!(plain.graph.len(), 15);

    let with_dns = build(&custom_domain_settings());
    assert_eq!(with_dns.graph.len(), 21);
    assert!(with_dns.graph.get("zone").is_some());
    assert!(with_dns.graph.get("https-listener").is_some());
}
