// noise/simplex.rs — simplex noise in 2, 3, 4 and 6 dimensions
//
// 2D/3D are the classic skew-unskew formulations with a lookup-table
// gradient per corner. 4D picks its simplex with the magnitude-ordering
// table; 6D walks the 7 corners of the containing simplex in sorted
// coordinate-magnitude order.
//
// The trailing scale/offset constants were tuned empirically against the
// raw kernel sums and must not be changed: they define the output range
// the rest of the graph (and its auto-correction magic numbers) expects.

use super::hash::{fast_floor, hash_lattice};
use super::lut::tables;

const F2: f64 = 0.366_025_403_784_438_646_763_723_170_752_94;
const G2: f64 = 0.211_324_865_405_187_117_745_425_609_749_02;
const F3: f64 = 1.0 / 3.0;
const G3: f64 = 1.0 / 6.0;

/// 2D simplex noise, scaled to approximately [-1, 1].
pub fn simplex_2(p: [f64; 2], seed: i32) -> f64 {
    let [x, y] = p;

    let s = (x + y) * F2;
    let i = fast_floor(x + s);
    let j = fast_floor(y + s);

    let t = f64::from(i + j) * G2;
    let x0 = x - (f64::from(i) - t);
    let y0 = y - (f64::from(j) - t);

    // Which triangle of the skewed square the point lies in.
    let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

    let x1 = x0 - f64::from(i1) + G2;
    let y1 = y0 - f64::from(j1) + G2;
    let x2 = x0 - 1.0 + 2.0 * G2;
    let y2 = y0 - 1.0 + 2.0 * G2;

    let g = &tables().gradient2;
    let g0 = &g[hash_lattice([i, j], seed) as usize];
    let g1 = &g[hash_lattice([i + i1, j + j1], seed) as usize];
    let g2 = &g[hash_lattice([i + 1, j + 1], seed) as usize];

    let mut n = 0.0;
    let mut t0 = 0.5 - x0 * x0 - y0 * y0;
    if t0 >= 0.0 {
        t0 *= t0;
        n += t0 * t0 * (g0[0] * x0 + g0[1] * y0);
    }
    let mut t1 = 0.5 - x1 * x1 - y1 * y1;
    if t1 >= 0.0 {
        t1 *= t1;
        n += t1 * t1 * (g1[0] * x1 + g1[1] * y1);
    }
    let mut t2 = 0.5 - x2 * x2 - y2 * y2;
    if t2 >= 0.0 {
        t2 *= t2;
        n += t2 * t2 * (g2[0] * x2 + g2[1] * y2);
    }

    (70.0 * n) * 1.421_886_95 + 0.001_054_489
}

/// 3D simplex noise, scaled to approximately [-1, 1].
pub fn simplex_3(p: [f64; 3], seed: i32) -> f64 {
    let [x, y, z] = p;

    let s = (x + y + z) * F3;
    let i = fast_floor(x + s);
    let j = fast_floor(y + s);
    let k = fast_floor(z + s);

    let t = f64::from(i + j + k) * G3;
    let x0 = x - (f64::from(i) - t);
    let y0 = y - (f64::from(j) - t);
    let z0 = z - (f64::from(k) - t);

    // Rank x0/y0/z0 to pick the traversal order through the tetrahedron.
    let (i1, j1, k1, i2, j2, k2) = if x0 >= y0 {
        if y0 >= z0 {
            (1, 0, 0, 1, 1, 0)
        } else if x0 >= z0 {
            (1, 0, 0, 1, 0, 1)
        } else {
            (0, 0, 1, 1, 0, 1)
        }
    } else if y0 < z0 {
        (0, 0, 1, 0, 1, 1)
    } else if x0 < z0 {
        (0, 1, 0, 0, 1, 1)
    } else {
        (0, 1, 0, 1, 1, 0)
    };

    let x1 = x0 - f64::from(i1) + G3;
    let y1 = y0 - f64::from(j1) + G3;
    let z1 = z0 - f64::from(k1) + G3;
    let x2 = x0 - f64::from(i2) + 2.0 * G3;
    let y2 = y0 - f64::from(j2) + 2.0 * G3;
    let z2 = z0 - f64::from(k2) + 2.0 * G3;
    let x3 = x0 - 1.0 + 3.0 * G3;
    let y3 = y0 - 1.0 + 3.0 * G3;
    let z3 = z0 - 1.0 + 3.0 * G3;

    let g = &tables().gradient3;
    let g0 = &g[hash_lattice([i, j, k], seed) as usize];
    let g1 = &g[hash_lattice([i + i1, j + j1, k + k1], seed) as usize];
    let g2 = &g[hash_lattice([i + i2, j + j2, k + k2], seed) as usize];
    let g3 = &g[hash_lattice([i + 1, j + 1, k + 1], seed) as usize];

    let mut n = 0.0;
    let mut t0 = 0.6 - x0 * x0 - y0 * y0 - z0 * z0;
    if t0 >= 0.0 {
        t0 *= t0;
        n += t0 * t0 * (g0[0] * x0 + g0[1] * y0 + g0[2] * z0);
    }
    let mut t1 = 0.6 - x1 * x1 - y1 * y1 - z1 * z1;
    if t1 >= 0.0 {
        t1 *= t1;
        n += t1 * t1 * (g1[0] * x1 + g1[1] * y1 + g1[2] * z1);
    }
    let mut t2 = 0.6 - x2 * x2 - y2 * y2 - z2 * z2;
    if t2 >= 0.0 {
        t2 *= t2;
        n += t2 * t2 * (g2[0] * x2 + g2[1] * y2 + g2[2] * z2);
    }
    let mut t3 = 0.6 - x3 * x3 - y3 * y3 - z3 * z3;
    if t3 >= 0.0 {
        t3 *= t3;
        n += t3 * t3 * (g3[0] * x3 + g3[1] * y3 + g3[2] * z3);
    }

    (32.0 * n) * 1.250_868_85 + 0.000_319_498_4
}

/// Ordering table for the 4D case: for each outcome of the six pairwise
/// coordinate comparisons, the rank of each axis. Rows whose comparison
/// pattern is impossible stay zeroed and are never hit.
#[rustfmt::skip]
const SIMPLEX_ORDER_4: [[i32; 4]; 64] = [
    [0, 1, 2, 3], [0, 1, 3, 2], [0, 0, 0, 0], [0, 2, 3, 1],
    [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [1, 2, 3, 0],
    [0, 2, 1, 3], [0, 0, 0, 0], [0, 3, 1, 2], [0, 3, 2, 1],
    [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [1, 3, 2, 0],
    [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0],
    [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0],
    [1, 2, 0, 3], [0, 0, 0, 0], [1, 3, 0, 2], [0, 0, 0, 0],
    [0, 0, 0, 0], [0, 0, 0, 0], [2, 3, 0, 1], [2, 3, 1, 0],
    [1, 0, 2, 3], [1, 0, 3, 2], [0, 0, 0, 0], [0, 0, 0, 0],
    [0, 0, 0, 0], [2, 0, 3, 1], [0, 0, 0, 0], [2, 1, 3, 0],
    [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0],
    [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0],
    [2, 0, 1, 3], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0],
    [3, 0, 1, 2], [3, 0, 2, 1], [0, 0, 0, 0], [3, 1, 2, 0],
    [2, 1, 0, 3], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0],
    [3, 1, 0, 2], [0, 0, 0, 0], [3, 2, 0, 1], [3, 2, 1, 0],
];

/// 4D simplex noise over the 5 corners of the containing simplex.
pub fn simplex_4(p: [f64; 4], seed: i32) -> f64 {
    let [x, y, z, w] = p;

    let f4 = (5.0_f64.sqrt() - 1.0) / 4.0;
    let g4 = (5.0 - 5.0_f64.sqrt()) / 20.0;

    let s = (x + y + z + w) * f4;
    let i = fast_floor(x + s);
    let j = fast_floor(y + s);
    let k = fast_floor(z + s);
    let l = fast_floor(w + s);

    let t = f64::from(i + j + k + l) * g4;
    let x0 = x - (f64::from(i) - t);
    let y0 = y - (f64::from(j) - t);
    let z0 = z - (f64::from(k) - t);
    let w0 = w - (f64::from(l) - t);

    // Six pairwise comparisons index the ordering table.
    let c = ((x0 > y0) as usize) << 5
        | ((x0 > z0) as usize) << 4
        | ((y0 > z0) as usize) << 3
        | ((x0 > w0) as usize) << 2
        | ((y0 > w0) as usize) << 1
        | (z0 > w0) as usize;
    let order = &SIMPLEX_ORDER_4[c];

    let step = |rank: i32| -> [i32; 4] {
        [
            (order[0] >= rank) as i32,
            (order[1] >= rank) as i32,
            (order[2] >= rank) as i32,
            (order[3] >= rank) as i32,
        ]
    };
    let [i1, j1, k1, l1] = step(3);
    let [i2, j2, k2, l2] = step(2);
    let [i3, j3, k3, l3] = step(1);

    let corner = |oi: i32, oj: i32, ok: i32, ol: i32, round: f64| -> [f64; 4] {
        [
            x0 - f64::from(oi) + round * g4,
            y0 - f64::from(oj) + round * g4,
            z0 - f64::from(ok) + round * g4,
            w0 - f64::from(ol) + round * g4,
        ]
    };

    let offsets = [
        [x0, y0, z0, w0],
        corner(i1, j1, k1, l1, 1.0),
        corner(i2, j2, k2, l2, 2.0),
        corner(i3, j3, k3, l3, 3.0),
        corner(1, 1, 1, 1, 4.0),
    ];
    let lattice = [
        [i, j, k, l],
        [i + i1, j + j1, k + k1, l + l1],
        [i + i2, j + j2, k + k2, l + l2],
        [i + i3, j + j3, k + k3, l + l3],
        [i + 1, j + 1, k + 1, l + 1],
    ];

    let g = &tables().gradient4;
    let mut n = 0.0;
    for (o, cell) in offsets.iter().zip(&lattice) {
        let mut t = 0.6;
        for d in o {
            t -= d * d;
        }
        if t >= 0.0 {
            let grad = &g[hash_lattice(*cell, seed) as usize];
            t *= t;
            let dot: f64 = o.iter().zip(grad).map(|(a, b)| a * b).sum();
            n += t * t * dot;
        }
    }

    27.0 * n
}

/// 6D simplex noise: skew, then visit the 7 simplex corners in order of
/// descending cell-distance magnitude.
pub fn simplex_6(p: [f64; 6], seed: i32) -> f64 {
    let f6 = (7.0_f64.sqrt() - 1.0) / 6.0;
    let g6 = f6 / (1.0 + 6.0 * f6);

    let side_length = 6.0_f64.sqrt() / (6.0 * f6 + 1.0);
    let a = (side_length * side_length - (side_length / 2.0) * (side_length / 2.0)).sqrt();
    let corner_face = (a * a + (a / 2.0) * (a / 2.0)).sqrt();
    let corner_face_sq = corner_face * corner_face;

    let mut value_scaler = 5.0_f64.powf(-0.5);
    value_scaler *= 5.0_f64.powf(-3.5) * 100.0 + 13.0;

    let s: f64 = p.iter().sum::<f64>() * f6;

    let skew: [i32; 6] = std::array::from_fn(|i| fast_floor(p[i] + s));
    let mut int_loc = skew;

    let unskew = skew.iter().map(|&c| f64::from(c)).sum::<f64>() * g6;
    let cell_dist: [f64; 6] = std::array::from_fn(|i| p[i] - f64::from(skew[i]) + unskew);

    // Axis indices sorted by ascending cell distance; each corner visit
    // advances the next axis in that order.
    let mut order: [usize; 6] = [0, 1, 2, 3, 4, 5];
    order.sort_by(|&a, &b| cell_dist[a].total_cmp(&cell_dist[b]));

    let g = &tables().gradient6;
    let mut n = 0.0;
    let mut skew_offset = 0.0;

    for c in 0..7 {
        if c > 0 {
            int_loc[order[c - 1]] += 1;
        }

        let mut t = corner_face_sq;
        let mut offset = [0.0; 6];
        for d in 0..6 {
            offset[d] = cell_dist[d] - f64::from(int_loc[d] - skew[d]) + skew_offset;
            t -= offset[d] * offset[d];
        }

        if t > 0.0 {
            let grad = &g[hash_lattice(int_loc, seed) as usize];
            let dot: f64 = offset.iter().zip(grad).map(|(a, b)| a * b).sum();
            n += dot * t * t * t * t;
        }
        skew_offset += g6;
    }

    n * value_scaler
}
