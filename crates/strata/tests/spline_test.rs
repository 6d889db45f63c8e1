use strata::spline::{bspline_to_bezier, evaluate};
use strata_graph::Point;

fn close(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
}

#[test]
fn fewer_than_two_points_give_no_curve() {
    assert!(bspline_to_bezier(&[]).is_empty());
    assert!(bspline_to_bezier(&[Point::new(1.0, 2.0)]).is_empty());
}

#[test]
fn two_points_give_a_straight_segment() {
    let (a, b) = (Point::new(0.0, 0.0), Point::new(30.0, 0.0));
    let chain = bspline_to_bezier(&[a, b]);
    assert_eq!(chain.len(), 2);
    assert!(close(chain[0], Point::new(10.0, 0.0)));
    assert!(close(chain[1], Point::new(20.0, 0.0)));
    let mid = evaluate(a, &chain, b, 0, 0.5).unwrap();
    assert!(close(mid, Point::new(15.0, 0.0)));
}

#[test]
fn chain_length_is_three_per_segment_minus_the_end() {
    let points: Vec<Point> = (0..6)
        .map(|i| Point::new(i as f64 * 10.0, if i % 2 == 0 { 0.0 } else { 10.0 }))
        .collect();
    let chain = bspline_to_bezier(&points);
    assert_eq!(chain.len(), 3 * 5 - 1);
}

#[test]
fn curve_starts_and_ends_at_the_end_points() {
    let points = [
        Point::new(0.0, 0.0),
        Point::new(10.0, -10.0),
        Point::new(20.0, 5.0),
        Point::new(30.0, 0.0),
    ];
    let (start, end) = (points[0], points[3]);
    let chain = bspline_to_bezier(&points);
    assert!(close(evaluate(start, &chain, end, 0, 0.0).unwrap(), start));
    assert!(close(evaluate(start, &chain, end, 2, 1.0).unwrap(), end));

    // Segments join where one ends and the next starts.
    let joint = evaluate(start, &chain, end, 0, 1.0).unwrap();
    assert!(close(joint, evaluate(start, &chain, end, 1, 0.0).unwrap()));
    assert!(evaluate(start, &chain, end, 3, 0.0).is_none());
}

#[test]
fn collinear_control_points_stay_on_the_line() {
    let points: Vec<Point> = (0..4).map(|i| Point::new(i as f64, 2.0 * i as f64)).collect();
    for p in bspline_to_bezier(&points) {
        assert!((p.y - 2.0 * p.x).abs() < 1e-9);
    }
}
