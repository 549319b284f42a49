use detpipe::{iou, BBox};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_box(rng: &mut StdRng) -> BBox {
    let x1 = rng.random_range(0.0f32..600.0);
    let y1 = rng.random_range(0.0f32..600.0);
    let w = rng.random_range(1.0f32..120.0);
    let h = rng.random_range(1.0f32..120.0);
    BBox::new(x1, y1, x1 + w, y1 + h)
}

#[test]
fn iou_is_symmetric() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..500 {
        let a = random_box(&mut rng);
        let b = random_box(&mut rng);
        assert_eq!(iou(&a, &b), iou(&b, &a));
    }
}

#[test]
fn iou_of_box_with_itself_is_one() {
    let mut rng = StdRng::seed_from_u64(12);
    for _ in 0..500 {
        let a = random_box(&mut rng);
        assert_eq!(iou(&a, &a), 1.0);
    }
}

#[test]
fn disjoint_boxes_have_zero_iou() {
    let a = BBox::new(0.0, 0.0, 5.0, 5.0);
    let b = BBox::new(20.0, 20.0, 25.0, 25.0);
    assert_eq!(iou(&a, &b), 0.0);

    // Touching edges share no area.
    let c = BBox::new(5.0, 0.0, 10.0, 5.0);
    assert_eq!(iou(&a, &c), 0.0);
}

#[test]
fn iou_stays_within_unit_range() {
    let mut rng = StdRng::seed_from_u64(13);
    for _ in 0..500 {
        let a = random_box(&mut rng);
        let b = random_box(&mut rng);
        let value = iou(&a, &b);
        assert!((0.0..=1.0).contains(&value), "iou {value} out of range");
    }
}

#[test]
fn nested_box_iou_is_area_ratio() {
    let outer = BBox::new(0.0, 0.0, 10.0, 10.0);
    let inner = BBox::new(2.0, 2.0, 7.0, 7.0);
    assert!((iou(&outer, &inner) - 0.25).abs() < 1e-6);
}
