use densela::linalg::{
    BidiagonalDecomposition, BidiagonalResult, CholeskyDecomposition, CholeskyResult,
    EigenResult, GeneralEigen, HessenbergDecomposition, HessenbergResult, LuDecomposition,
    LuResult, QrColumnDecomposition, QrDecomposition, QrResult, SvdDecomposition, SvdResult,
    SvdSettings, SymmetricEigen, TridiagonalDecomposition, TridiagonalResult, Triangle,
};
use densela::DynMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TOL: f64 = 1e-8;

fn assert_near(a: f64, b: f64, tol: f64, msg: &str) {
    assert!((a - b).abs() < tol, "{}: {} vs {} (diff {})", msg, a, b, (a - b).abs());
}

fn random(rng: &mut StdRng, m: usize, n: usize) -> DynMatrix<f64> {
    let rng = std::cell::RefCell::new(rng);
    DynMatrix::from_fn(m, n, |_, _| rng.borrow_mut().gen_range(-1.0..1.0))
}

fn random_symmetric(rng: &mut StdRng, n: usize) -> DynMatrix<f64> {
    let b = random(rng, n, n);
    &b + &b.transpose()
}

fn random_spd(rng: &mut StdRng, n: usize) -> DynMatrix<f64> {
    let b = random(rng, n, n);
    &b.transpose_mul(&b) + &DynMatrix::eye(n, 0.0)
}

fn assert_orthonormal_columns(q: &DynMatrix<f64>, msg: &str) {
    let qtq = q.transpose_mul(q);
    assert!(qtq.approx_eq(&DynMatrix::eye(q.ncols(), 0.0), TOL), "{}: QᵀQ = {}", msg, qtq);
}

const SHAPES: [(usize, usize); 7] = [(1, 1), (2, 2), (5, 5), (8, 3), (3, 8), (12, 7), (7, 12)];

// ── LU ──────────────────────────────────────────────────────────────

#[test]
fn lu_known_factors() {
    let a = DynMatrix::from_rows(3, 3, &[5.0, 2.0, 3.0, 1.5, -2.0, 8.0, -3.0, 4.7, -0.5]);
    let lu = LuDecomposition::new(&a);

    // row order after pivoting: 0, 2, 1
    let l_expected = [1.0, 0.0, 0.0, -0.6, 1.0, 0.0, 0.3, -0.44068, 1.0];
    let u_expected = [5.0, 2.0, 3.0, 0.0, 5.9, 1.3, 0.0, 0.0, 7.67288];
    let (l, u) = (lu.get_l(), lu.get_u());
    for k in 0..9 {
        assert_near(l.as_slice()[k], l_expected[k], 1e-5, "L");
        assert_near(u.as_slice()[k], u_expected[k], 1e-5, "U");
    }
    assert_eq!(lu.pivot(), &[0, 2, 1]);
}

#[test]
fn lu_reconstruction_random() {
    let mut rng = StdRng::seed_from_u64(11);
    for &(m, n) in &SHAPES {
        let a = random(&mut rng, m, n);
        let lu = LuDecomposition::new(&a);
        let pa = &lu.get_p(false) * &a;
        assert!(pa.approx_eq(&(&lu.get_l() * &lu.get_u()), TOL), "{}x{}", m, n);
        let back = &lu.get_p(true) * &(&lu.get_l() * &lu.get_u());
        assert!(back.approx_eq(&a, TOL), "{}x{} Pᵀ·L·U", m, n);
    }
}

#[test]
fn lu_determinant_matches_product_rule() {
    let mut rng = StdRng::seed_from_u64(12);
    let a = random(&mut rng, 5, 5);
    let b = random(&mut rng, 5, 5);
    let dab = LuDecomposition::new(&(&a * &b)).determinant();
    let da = LuDecomposition::new(&a).determinant();
    let db = LuDecomposition::new(&b).determinant();
    assert_near(dab, da * db, 1e-10, "det(AB)");
}

// ── QR ──────────────────────────────────────────────────────────────

#[test]
fn qr_known_factors() {
    let a = DynMatrix::from_rows(3, 3, &[0.0, 3.0, 1.0, 0.0, 4.0, -2.0, 2.0, 1.0, 1.0]);
    let q_expected = DynMatrix::from_rows(3, 3, &[0.0, -0.6, 0.8, 0.0, -0.8, -0.6, -1.0, 0.0, 0.0]);
    let r_expected = DynMatrix::from_rows(3, 3, &[-2.0, -1.0, -1.0, 0.0, -5.0, 1.0, 0.0, 0.0, 2.0]);

    let row = QrDecomposition::new(&a);
    assert!(row.get_q(false).approx_eq(&q_expected, 1e-12));
    assert!(row.get_r(false).approx_eq(&r_expected, 1e-12));

    let col = QrColumnDecomposition::new(&a);
    assert!(col.get_q(false).approx_eq(&q_expected, 1e-12));
    assert!(col.get_r(false).approx_eq(&r_expected, 1e-12));
}

#[test]
fn qr_variants_agree_on_random_shapes() {
    let mut rng = StdRng::seed_from_u64(21);
    for &(m, n) in &SHAPES {
        let a = random(&mut rng, m, n);
        let row = QrDecomposition::new(&a);
        let col = QrColumnDecomposition::new(&a);
        for compact in [true, false] {
            let q = row.get_q(compact);
            let r = row.get_r(compact);
            assert!((&q * &r).approx_eq(&a, TOL), "{}x{} compact={}", m, n, compact);
            assert_orthonormal_columns(&q, "Q");
            assert!(q.approx_eq(&col.get_q(compact), TOL));
            assert!(r.approx_eq(&col.get_r(compact), TOL));
        }
        for i in 0..m.min(n) {
            assert_near(row.gammas()[i], col.gammas()[i], 1e-12, "γ");
        }
    }
}

#[test]
fn qr_zero_matrix_gives_identity() {
    let a = DynMatrix::zeros(4, 3, 0.0);
    let qr = QrDecomposition::new(&a);
    assert_eq!(qr.get_q(false), DynMatrix::eye(4, 0.0));
    assert_eq!(qr.get_r(false), DynMatrix::zeros(4, 3, 0.0));
    assert!(qr.is_degenerate());
    assert!(!qr.get_q(false).has_uncountable());
}

// ── Cholesky ────────────────────────────────────────────────────────

#[test]
fn cholesky_both_triangles_random() {
    let mut rng = StdRng::seed_from_u64(31);
    for n in [1, 4, 9] {
        let a = random_spd(&mut rng, n);
        let lower = CholeskyDecomposition::with_triangle(&a, Triangle::Lower).unwrap();
        let l = lower.get_t();
        assert!((&l * &l.transpose()).approx_eq(&a, TOL));

        let upper = CholeskyDecomposition::with_triangle(&a, Triangle::Upper).unwrap();
        let r = upper.get_t();
        assert!(r.transpose_mul(&r).approx_eq(&a, TOL));
        assert!(r.approx_eq(&l.transpose(), TOL));
        assert_near(lower.determinant(), upper.determinant(), 1e-8, "det");
    }
}

#[test]
fn cholesky_rejects_indefinite() {
    let a = DynMatrix::from_rows(2, 2, &[1.0, -2.0, -1.0, -2.0]);
    assert!(CholeskyDecomposition::new(&a).is_err());
    assert!(CholeskyDecomposition::with_triangle(&a, Triangle::Upper).is_err());
}

// ── Bidiagonal / Hessenberg / Tridiagonal ──────────────────────────

#[test]
fn bidiagonal_random_shapes() {
    let mut rng = StdRng::seed_from_u64(41);
    for &(m, n) in &SHAPES {
        let a = random(&mut rng, m, n);
        let bd = BidiagonalDecomposition::new(&a);
        for compact in [true, false] {
            let u = bd.get_u(false, compact);
            let b = bd.get_b(compact);
            let v = bd.get_v(false, compact);
            assert!((&(&u * &b) * &v.transpose()).approx_eq(&a, TOL), "{}x{}", m, n);
            assert_orthonormal_columns(&u, "U");
            assert_orthonormal_columns(&v, "V");
            assert!(bd.get_u(true, compact).approx_eq(&u.transpose(), 0.0));
            assert!(bd.get_v(true, compact).approx_eq(&v.transpose(), 0.0));
        }
    }
}

#[test]
fn hessenberg_random() {
    let mut rng = StdRng::seed_from_u64(51);
    for n in [1, 2, 3, 6, 10] {
        let a = random(&mut rng, n, n);
        let hd = HessenbergDecomposition::new(&a);
        let (q, h) = (hd.get_q(false), hd.get_h());
        assert!((&(&q * &h) * &q.transpose()).approx_eq(&a, TOL));
        assert_orthonormal_columns(&q, "Q");
        assert!(hd.get_q(true).approx_eq(&q.transpose(), 0.0));
    }
}

#[test]
fn tridiagonal_random() {
    let mut rng = StdRng::seed_from_u64(52);
    for n in [1, 2, 5, 9] {
        let a = random_symmetric(&mut rng, n);
        let td = TridiagonalDecomposition::new(&a);
        let (q, t) = (td.get_q(false), td.get_t());
        assert!((&(&q * &t) * &q.transpose()).approx_eq(&a, TOL));
        assert_orthonormal_columns(&q, "Q");
    }
}

// ── SVD ─────────────────────────────────────────────────────────────

#[test]
fn svd_random_shapes() {
    let mut rng = StdRng::seed_from_u64(61);
    for &(m, n) in &SHAPES {
        let a = random(&mut rng, m, n);
        for compact in [true, false] {
            let settings = SvdSettings {
                compact,
                ..SvdSettings::default()
            };
            let svd = SvdDecomposition::with_settings(&a, settings).unwrap();
            let s = svd.singular_values();
            assert!(s.iter().all(|&x| x >= 0.0), "negative singular value in {:?}", s);
            for pair in s.windows(2) {
                assert!(pair[0] >= pair[1]);
            }

            let (u, w, v) = (svd.get_u(false), svd.get_w(), svd.get_v(false));
            assert!((&(&u * &w) * &v.transpose()).approx_eq(&a, TOL), "{}x{} compact={}", m, n, compact);
            assert_orthonormal_columns(&u, "U");
            assert_orthonormal_columns(&v, "V");
        }
    }
}

#[test]
fn svd_of_transpose_swaps_factors() {
    let mut rng = StdRng::seed_from_u64(62);
    let a = random(&mut rng, 6, 4);
    let svd = SvdDecomposition::new(&a).unwrap();
    let svd_t = SvdDecomposition::new(&a.transpose()).unwrap();
    for (x, y) in svd.singular_values().iter().zip(svd_t.singular_values()) {
        assert_near(*x, *y, 1e-12, "σ(A) = σ(Aᵀ)");
    }
    // columns agree up to sign
    let (u, vt_u) = (svd.get_u(false), svd_t.get_v(false));
    for j in 0..4 {
        let dot: f64 = (0..6).map(|i| u[(i, j)] * vt_u[(i, j)]).sum();
        assert_near(dot.abs(), 1.0, 1e-8, "|uⱼ·vⱼ|");
    }
}

#[test]
fn svd_zero_matrix() {
    let a = DynMatrix::zeros(3, 5, 0.0);
    let svd = SvdDecomposition::with_settings(
        &a,
        SvdSettings {
            compact: false,
            ..SvdSettings::default()
        },
    )
    .unwrap();
    assert!(svd.singular_values().iter().all(|&s| s == 0.0));
    assert_eq!(svd.get_u(false), DynMatrix::eye(3, 0.0));
    assert_eq!(svd.get_v(false), DynMatrix::eye(5, 0.0));
    assert!(!svd.get_w().has_uncountable());
}

// ── Eigen ───────────────────────────────────────────────────────────

#[test]
fn symmetric_eigen_random() {
    let mut rng = StdRng::seed_from_u64(71);
    for n in [1, 3, 6, 11] {
        let a = random_symmetric(&mut rng, n);
        let eig = SymmetricEigen::new(&a).unwrap();
        let v = eig.eigenvectors();
        let lambda = DynMatrix::from_diagonal(eig.eigenvalues());
        assert!((&(&v.transpose() * &lambda) * v).approx_eq(&a, TOL));
        assert_orthonormal_columns(&v.transpose(), "V");
        for i in 0..n {
            assert_eq!(eig.eigenvalue(i).im, 0.0);
        }
    }
}

#[test]
fn symmetric_and_general_eigen_agree() {
    let mut rng = StdRng::seed_from_u64(72);
    let a = random_symmetric(&mut rng, 7);
    let sym = SymmetricEigen::new(&a).unwrap();
    let gen = GeneralEigen::new(&a).unwrap();

    let mut re: Vec<f64> = gen.eigenvalues().iter().map(|l| l.re).collect();
    re.sort_by(|x, y| x.total_cmp(y));
    for (x, y) in re.iter().zip(sym.eigenvalues()) {
        assert_near(*x, *y, 1e-8, "λ");
    }
    for l in gen.eigenvalues() {
        assert_near(l.im, 0.0, 1e-8, "symmetric input has real spectrum");
    }
}

#[test]
fn general_eigen_random_schur() {
    let mut rng = StdRng::seed_from_u64(73);
    for n in [3, 5, 8] {
        let a = random(&mut rng, n, n);
        let eig = GeneralEigen::new(&a).unwrap();
        let (s, q) = (eig.schur_form(), eig.schur_vectors().unwrap());
        assert!((&(q * s) * &q.transpose()).approx_eq(&a, TOL));

        let trace: f64 = (0..n).map(|i| a[(i, i)]).sum();
        let sum: f64 = eig.eigenvalues().iter().map(|l| l.re).sum();
        assert_near(sum, trace, 1e-8, "trace");

        for i in 0..n {
            if let Some(x) = eig.eigenvector(i) {
                let lambda = eig.eigenvalue(i).re;
                let ax = a.mul_vec(&x);
                for k in 0..n {
                    assert_near(ax[k], lambda * x[k], 1e-6, "A·x = λ·x");
                }
            }
        }
    }
}
