//! End-to-end recognition over a small STEP part: a 10 mm block with a
//! through bore split into two half faces and one toroidal blend.

use std::path::Path;

use approx::assert_relative_eq;
use facerec_cad::{CadKernel, Solid, StepImportOptions, StepKernel};
use facerec_core::{
    BatchDriver, BatchOptions, DocumentOptions, FaceSummary, FaultPolicy, FeatureDocument,
    on_faces_selected,
};
use glam::DVec3;

const BLOCK: &str = "ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('block with bore'),'2;1');
FILE_NAME('block.step','2024-01-01T00:00:00',(''),(''),'','','');
FILE_SCHEMA(('AUTOMOTIVE_DESIGN { 1 0 10303 214 1 1 1 1 }'));
ENDSEC;
DATA;
#1 = ( LENGTH_UNIT() NAMED_UNIT(*) SI_UNIT(.MILLI.,.METRE.) );
#10 = CARTESIAN_POINT('',(0.,0.,0.));
#11 = CARTESIAN_POINT('',(0.,0.,10.));
#12 = CARTESIAN_POINT('',(0.,10.,0.));
#13 = CARTESIAN_POINT('',(10.,0.,0.));
#14 = CARTESIAN_POINT('',(5.,5.,0.));
#15 = CARTESIAN_POINT('',(7.,5.,0.));
#20 = DIRECTION('',(0.,0.,1.));
#21 = DIRECTION('',(0.,0.,-1.));
#22 = DIRECTION('',(1.,0.,0.));
#23 = DIRECTION('',(-1.,0.,0.));
#24 = DIRECTION('',(0.,1.,0.));
#25 = DIRECTION('',(0.,-1.,0.));
#30 = AXIS2_PLACEMENT_3D('',#10,#21,#22);
#31 = AXIS2_PLACEMENT_3D('',#11,#20,#22);
#32 = AXIS2_PLACEMENT_3D('',#10,#25,#22);
#33 = AXIS2_PLACEMENT_3D('',#12,#24,#22);
#34 = AXIS2_PLACEMENT_3D('',#10,#23,#24);
#35 = AXIS2_PLACEMENT_3D('',#13,#22,#24);
#36 = AXIS2_PLACEMENT_3D('',#14,#20,#22);
#40 = PLANE('',#30);
#41 = PLANE('',#31);
#42 = PLANE('',#32);
#43 = PLANE('',#33);
#44 = PLANE('',#34);
#45 = PLANE('',#35);
#46 = CYLINDRICAL_SURFACE('',#36,2.);
#47 = TOROIDAL_SURFACE('',#36,20.,1.);
#50 = VERTEX_POINT('',#11);
#51 = VERTEX_POINT('',#12);
#52 = EDGE_CURVE('',#50,#51,#60,.T.);
#53 = ORIENTED_EDGE('',*,*,#52,.T.);
#54 = EDGE_LOOP('',(#53));
#55 = FACE_OUTER_BOUND('',#54,.T.);
#56 = VERTEX_POINT('',#15);
#57 = EDGE_CURVE('',#56,#56,#62,.T.);
#58 = ORIENTED_EDGE('',*,*,#57,.T.);
#59 = EDGE_LOOP('',(#58));
#60 = LINE('',#11,#61);
#61 = VECTOR('',#24,10.);
#62 = CIRCLE('',#36,2.);
#63 = FACE_BOUND('',#59,.T.);
#70 = ADVANCED_FACE('IT:7 Ra:1.6',(),#40,.T.);
#71 = ADVANCED_FACE('IT:6 Ra:0.8',(#55),#41,.T.);
#72 = ADVANCED_FACE('',(),#42,.T.);
#73 = ADVANCED_FACE('IT:9 Ra:6.3',(),#43,.T.);
#74 = ADVANCED_FACE('IT:9 Ra:6.3',(),#44,.T.);
#75 = ADVANCED_FACE('NONE',(),#45,.T.);
#76 = ADVANCED_FACE('IT:8 Ra:3.2',(#63),#46,.F.);
#77 = ADVANCED_FACE('IT:8 Ra:3.2',(#63),#46,.F.);
#78 = ADVANCED_FACE('fillet',(),#47,.T.);
#80 = CLOSED_SHELL('',(#70,#71,#72,#73,#74,#75,#76,#77,#78));
#81 = MANIFOLD_SOLID_BREP('block',#80);
ENDSEC;
END-ISO-10303-21;
";

fn load_block(kernel: &StepKernel, dir: &Path) -> Solid {
    let path = dir.join("block.step");
    std::fs::write(&path, BLOCK).unwrap();
    kernel
        .import_step(&path, &StepImportOptions::default())
        .unwrap()
}

#[test]
fn test_batch_writes_features_json() {
    let dir = tempfile::tempdir().unwrap();
    let kernel = StepKernel::new();
    let solid = load_block(&kernel, dir.path());

    let report = BatchDriver::new(&kernel, BatchOptions::default())
        .run(&solid)
        .unwrap();

    assert_eq!(report.counts.faces, 9);
    assert_eq!(report.counts.wires, 2);
    assert_eq!(report.counts.vertices, 3);
    assert_eq!(report.recognized, 8);
    assert_eq!(report.unrecognized, 1);
    assert!(report.skipped.is_empty());

    let registry = &report.registry;
    assert_eq!(registry.planes().len(), 6);
    assert_eq!(registry.cylinders().len(), 1);
    assert_eq!(registry.plane(2).unwrap().location, DVec3::new(0.0, 0.0, 10.0));
    for plane in registry.planes().values() {
        assert_relative_eq!(plane.normal.length(), 1.0, epsilon = 1e-9);
    }

    let output = dir.path().join("features.json");
    let options = DocumentOptions::default();
    registry.write_json(&output, &options).unwrap();

    let document = FeatureDocument::load_json(&output).unwrap();
    assert_eq!(document, registry.to_document(&options));
    assert_eq!(document.planes[&1].normal, DVec3::NEG_Z);
    assert_eq!(document.cylinders[&1].location, DVec3::new(5.0, 5.0, 0.0));
    assert_eq!(document.cylinders[&1].radius, None);

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    let keys: Vec<&String> = raw.as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 2);
    assert!(raw["cylinders"]["1"].get("radius").is_none());
}

#[test]
fn test_strict_batch_accepts_clean_part() {
    let dir = tempfile::tempdir().unwrap();
    let kernel = StepKernel::new();
    let solid = load_block(&kernel, dir.path());

    let options = BatchOptions {
        fault_policy: FaultPolicy::Abort,
    };
    let report = BatchDriver::new(&kernel, options).run(&solid).unwrap();
    assert_eq!(report.faces, 9);
}

#[test]
fn test_selection_summaries() {
    let dir = tempfile::tempdir().unwrap();
    let kernel = StepKernel::new();
    let solid = load_block(&kernel, dir.path());
    let faces = kernel.faces(&solid).unwrap();

    // Unlabeled, untagged and toroidal faces are skipped
    let picked = [faces[0], faces[1], faces[2], faces[5], faces[6], faces[8]];
    let summaries = on_faces_selected(&kernel, &picked);
    assert_eq!(summaries.len(), 3);

    assert!(matches!(summaries[0], FaceSummary::Plane { .. }));
    assert_eq!(summaries[0].tag().it_grade, 7);
    assert_eq!(summaries[1].tag().roughness, 0.8);
    match &summaries[2] {
        FaceSummary::Hole { face, radius, tag } => {
            assert_eq!(*face, faces[6]);
            assert_eq!(*radius, 2.0);
            assert_eq!(tag.it_grade, 8);
        }
        other => panic!("expected hole, got {:?}", other),
    }
}
