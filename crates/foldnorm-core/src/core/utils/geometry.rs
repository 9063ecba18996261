use nalgebra::{Matrix3, Point3, Vector3};

#[derive(Debug, Clone, Copy)]
pub struct Superposition {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
}

impl Superposition {
    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        self.rotation * point + self.translation
    }
}

fn centroid(points: &[Point3<f64>]) -> Vector3<f64> {
    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    sum / points.len() as f64
}

/// Kabsch fit of `mobile` onto `reference` over paired coordinates.
/// Returns `None` for mismatched or empty inputs, or if the SVD fails.
pub fn superpose(reference: &[Point3<f64>], mobile: &[Point3<f64>]) -> Option<Superposition> {
    if reference.len() != mobile.len() || reference.is_empty() {
        return None;
    }

    let ref_centroid = centroid(reference);
    let mob_centroid = centroid(mobile);

    let mut covariance = Matrix3::zeros();
    for (r, m) in reference.iter().zip(mobile.iter()) {
        let rc = r.coords - ref_centroid;
        let mc = m.coords - mob_centroid;
        covariance += mc * rc.transpose();
    }

    let svd = covariance.svd(true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;

    let mut correction = Matrix3::identity();
    if (v_t.transpose() * u.transpose()).determinant() < 0.0 {
        correction[(2, 2)] = -1.0;
    }

    let rotation = v_t.transpose() * correction * u.transpose();
    let translation = ref_centroid - rotation * mob_centroid;

    Some(Superposition {
        rotation,
        translation,
    })
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}
