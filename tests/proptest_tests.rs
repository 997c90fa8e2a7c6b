//! Property-based tests for joint, corner and extension invariants.

use proptest::prelude::*;

use fingerbox::finger::FeatureKind;
use fingerbox::geometry::Axis;
use fingerbox::math::Point2;
use fingerbox::operations::{AddCutout, AddSubdivision, SetEdgeExtension, SetEdgeExtensions, SetFaceSolid};
use fingerbox::panel::{Cutout, HoleKind, JointKind, PanelEdge};
use fingerbox::scene::{FaceId, PanelId};
use fingerbox::{MaterialConfig, Scene};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

/// Box dimensions that leave room for three finger sections at the default
/// material.
fn arb_dims() -> impl Strategy<Value = (f64, f64, f64)> {
    (40.0f64..220.0, 40.0f64..220.0, 40.0f64..220.0)
}

/// Outward extension large enough to give fillet-eligible step corners.
fn arb_extension() -> impl Strategy<Value = f64> {
    2.0f64..30.0
}

/// Front panel of a 100x80x60 box whose top and left faces are removed.
fn open_front() -> (Scene, PanelId) {
    let mut s = Scene::new(100.0, 80.0, 60.0, MaterialConfig::default()).unwrap();
    let root = s.root();
    SetFaceSolid::new(root, FaceId::Top, false).execute(&mut s).unwrap();
    SetFaceSolid::new(root, FaceId::Left, false).execute(&mut s).unwrap();
    let front = s.face_panel(root, FaceId::Front).unwrap().id;
    (s, front)
}

fn near(a: &Point2, b: &Point2) -> bool {
    (a - b).norm() < 1e-9
}

// ---------------------------------------------------------------------------
// 1. Joint symmetry: tab count equals slot count and anchors coincide
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn joints_are_symmetric(
        (w, h, d) in arb_dims(),
        split in prop::option::of(0.3f64..0.7),
    ) {
        let mut s = Scene::new(w, h, d, MaterialConfig::default()).unwrap();
        if let Some(f) = split {
            let void = s.root_void();
            AddSubdivision::new(void, Axis::X, w * f).execute(&mut s).unwrap();
        }
        prop_assert!(s.alignment_errors().is_empty(), "{:?}", s.alignment_errors());
        for joint in s.joints().iter().filter(|j| j.kind != JointKind::CrossLap) {
            let male = s.panel(joint.male).unwrap();
            let female = s.panel(joint.female).unwrap();
            let tabs = male.edge(joint.male_edge).feature_count(FeatureKind::Tab);
            let slots = joint.female_edge.map_or(0, |e| female.edge(e).feature_count(FeatureKind::Slot))
                + female
                    .holes
                    .iter()
                    .filter(|h| matches!(&h.kind, HoleKind::Slot { joint: j } if *j == joint.id))
                    .count();
            prop_assert_eq!(tabs, slots, "joint {}", joint.id);
            for anchor in &joint.anchors {
                let a = male.world_point(&anchor.male);
                let b = female.world_point(&anchor.female);
                prop_assert!((a - b).norm() < 1e-6);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// 2. Corner count: 4 + 2 per extended edge, +4 per inner rectangular cutout
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn eligible_corners_follow_extensions(
        top in prop::option::of(arb_extension()),
        left in prop::option::of(arb_extension()),
        cutout in prop::option::of(4.0f64..16.0),
    ) {
        let (mut s, front) = open_front();
        let mut extensions = Vec::new();
        extensions.extend(top.map(|a| (PanelEdge::Top, a)));
        extensions.extend(left.map(|a| (PanelEdge::Left, a)));
        let n = extensions.len();
        if n > 0 {
            SetEdgeExtensions::new(front, extensions).execute(&mut s).unwrap();
        }
        let mut expected = 4 + 2 * n;
        if let Some(size) = cutout {
            AddCutout::new(front, Cutout::rect(Point2::new(0.0, 0.0), size, size))
                .execute(&mut s)
                .unwrap();
            expected += 4;
        }
        prop_assert_eq!(s.panel(front).unwrap().eligible_corner_count(), expected);
    }
}

// ---------------------------------------------------------------------------
// 3. Corner merge: equal extensions on adjacent edges meet in one vertex
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn adjacent_extensions_merge(amount in arb_extension()) {
        let (mut s, front) = open_front();
        SetEdgeExtensions::new(front, vec![(PanelEdge::Top, amount), (PanelEdge::Left, amount)])
            .execute(&mut s)
            .unwrap();
        let outline = &s.panel(front).unwrap().outline;
        let corner = Point2::new(-50.0 - amount, 40.0 + amount);
        let hits = outline.iter().filter(|p| near(p, &corner)).count();
        prop_assert_eq!(hits, 1);
        let i = outline.iter().position(|p| near(p, &corner)).unwrap();
        let n = outline.len();
        prop_assert!((outline[(i + n - 1) % n].y - corner.y).abs() < 1e-9);
        prop_assert!((outline[(i + 1) % n].x - corner.x).abs() < 1e-9);
    }
}

// ---------------------------------------------------------------------------
// 4. Extending a slotted edge keeps every slot and the joint aligned
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn extended_female_edge_keeps_joint(
        edge in prop::sample::select(PanelEdge::ALL.to_vec()),
        amount in 1.0f64..20.0,
    ) {
        let mut s = Scene::new(100.0, 80.0, 60.0, MaterialConfig::default()).unwrap();
        let lid = s.face_panel(s.root(), FaceId::Top).unwrap().id;
        let slots_before = s.panel(lid).unwrap().edge(edge).feature_count(FeatureKind::Slot);
        prop_assume!(slots_before > 0);

        SetEdgeExtension::new(lid, edge, amount).execute(&mut s).unwrap();
        let panel = s.panel(lid).unwrap();
        let slot_holes = panel
            .holes
            .iter()
            .filter(|h| matches!(h.kind, HoleKind::Slot { .. }))
            .count();
        prop_assert_eq!(slot_holes, slots_before);
        prop_assert_eq!(panel.edge(edge).feature_count(FeatureKind::Slot), 0);
        prop_assert!(s.alignment_errors().is_empty(), "{:?}", s.alignment_errors());
        prop_assert!(s.check_geometry().passed);
    }
}
