use eos_project::schema::*;
use eos_project::{load, load_json, load_yaml, save, save_json, save_yaml, LATEST_VERSION};

fn gr_project() -> Project {
    Project {
        version: LATEST_VERSION,
        name: "GR torus".to_string(),
        eos: EosDef::GeneralRelativistic {
            gamma: 4.0 / 3.0,
            magnetic: true,
            floors: FloorsDef {
                density: 1e-8,
                pressure: 1e-10,
            },
            limits: LimitsDef {
                gamma_max: 50.0,
                sigma_max: Some(100.0),
                beta_min: 1e-3,
            },
            rho_floor: PowerLawDef { min: 1e-5, pow: -1.5 },
            pgas_floor: PowerLawDef { min: 1e-7, pow: -2.5 },
        },
        inversion: InversionDef {
            max_iterations: 50,
            tolerance: 1e-10,
        },
    }
}

#[test]
fn roundtrip_yaml_relativistic_project() {
    let project = gr_project();
    let path = std::env::temp_dir().join("eos_project_roundtrip_gr.yaml");
    save_yaml(&path, &project).unwrap();
    let loaded = load_yaml(&path).unwrap();
    assert_eq!(project, loaded);
}

#[test]
fn roundtrip_json_heterogeneous_project() {
    let project = Project {
        version: LATEST_VERSION,
        name: "Mixture".to_string(),
        eos: EosDef::Heterogeneous {
            gas_constant: 1.0,
            components: vec![
                ComponentDef {
                    name: "dry".to_string(),
                    mu: 1.0,
                    cv: 2.5,
                    latent: 0.0,
                    condensed: false,
                },
                ComponentDef {
                    name: "ice".to_string(),
                    mu: 0.6,
                    cv: 4.0,
                    latent: -3.0,
                    condensed: true,
                },
            ],
            floors: FloorsDef::default(),
        },
        inversion: InversionDef::default(),
    };
    let path = std::env::temp_dir().join("eos_project_roundtrip_mixture.json");
    save_json(&path, &project).unwrap();
    let loaded = load_json(&path).unwrap();
    assert_eq!(project, loaded);
}

#[test]
fn format_follows_extension() {
    let project = gr_project();
    let path = std::env::temp_dir().join("eos_project_roundtrip_ext.yml");
    save(&path, &project).unwrap();
    assert_eq!(load(&path).unwrap(), project);

    let bad = std::env::temp_dir().join("eos_project_roundtrip_ext.toml");
    assert!(matches!(
        save(&bad, &project),
        Err(eos_project::ProjectError::UnknownFormat { .. })
    ));
}

#[test]
fn defaults_fill_missing_fields() {
    let yaml = "version: 1\nname: minimal\neos:\n  type: special_relativistic\n  gamma: 1.4\n";
    let project: Project = serde_yaml::from_str(yaml).unwrap();
    match project.eos {
        EosDef::SpecialRelativistic {
            magnetic,
            limits,
            floors,
            ..
        } => {
            assert!(!magnetic);
            assert_eq!(limits, LimitsDef::default());
            assert_eq!(floors, FloorsDef::default());
        }
        other => panic!("unexpected variant {other:?}"),
    }
    assert_eq!(project.inversion, InversionDef::default());
}

#[test]
fn save_rejects_invalid_project() {
    let mut project = gr_project();
    project.version = LATEST_VERSION + 1;
    let path = std::env::temp_dir().join("eos_project_invalid.yaml");
    assert!(save_yaml(&path, &project).is_err());
}
