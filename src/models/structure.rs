//! # 晶体结构数据模型
//!
//! 定义统一的晶体结构表示。结构一旦构建即视为不可变，
//! 超胞和扰动变换都返回新的 `Crystal`。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`transform/`、`tasks/`、`workflow/` 使用
//! - 无外部模块依赖

use super::element::formula_order;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 晶格参数表示
///
/// 反序列化时既接受 `{"matrix": ...}`，也接受
/// `{"a", "b", "c", "alpha", "beta", "gamma"}` 形式的晶格参数。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LatticeRepr")]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，行向量表示 a, b, c
    /// [[a1, a2, a3], [b1, b2, b3], [c1, c2, c3]]
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格参数 (a, b, c, alpha, beta, gamma) 创建晶格
    /// 角度单位：度
    pub fn from_parameters(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        let (cos_alpha, cos_beta) = (alpha.to_radians().cos(), beta.to_radians().cos());
        let (sin_gamma, cos_gamma) = gamma.to_radians().sin_cos();

        let c1 = c * cos_beta;
        let c2 = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let c3 = (c * c - c1 * c1 - c2 * c2).sqrt();

        Lattice {
            matrix: [
                [a, 0.0, 0.0],
                [b * cos_gamma, b * sin_gamma, 0.0],
                [c1, c2, c3],
            ],
        }
    }

    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// 三个晶格向量的长度 (a, b, c)
    pub fn lengths(&self) -> [f64; 3] {
        self.matrix.map(norm)
    }

    /// 获取晶格参数 (a, b, c, alpha, beta, gamma)
    pub fn parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        let [a_vec, b_vec, c_vec] = self.matrix;
        let [a, b, c] = self.lengths();

        let alpha = (dot(b_vec, c_vec) / (b * c)).acos().to_degrees();
        let beta = (dot(a_vec, c_vec) / (a * c)).acos().to_degrees();
        let gamma = (dot(a_vec, b_vec) / (a * b)).acos().to_degrees();

        (a, b, c, alpha, beta, gamma)
    }

    /// 计算晶格体积（带符号的行列式）
    pub fn volume(&self) -> f64 {
        let [a, b, c] = self.matrix;
        dot(a, cross(b, c))
    }

    /// 三组晶面 (bc)、(ac)、(ab) 的面间距
    ///
    /// 对非正交晶胞，超胞"宽度"应以面间距而非晶格向量长度衡量。
    pub fn plane_spacings(&self) -> [f64; 3] {
        let [a, b, c] = self.matrix;
        let vol = self.volume().abs();
        [
            vol / norm(cross(b, c)),
            vol / norm(cross(a, c)),
            vol / norm(cross(a, b)),
        ]
    }

    /// 沿三个晶格向量分别放大 `scale` 倍
    pub fn scaled(&self, scale: [u32; 3]) -> Lattice {
        let mut matrix = self.matrix;
        for (row, &n) in matrix.iter_mut().zip(scale.iter()) {
            *row = row.map(|x| x * n as f64);
        }
        Lattice { matrix }
    }

    /// 分数坐标转笛卡尔坐标
    pub fn frac_to_cart(&self, frac: [f64; 3]) -> [f64; 3] {
        let m = self.matrix;
        [
            frac[0] * m[0][0] + frac[1] * m[1][0] + frac[2] * m[2][0],
            frac[0] * m[0][1] + frac[1] * m[1][1] + frac[2] * m[2][1],
            frac[0] * m[0][2] + frac[1] * m[1][2] + frac[2] * m[2][2],
        ]
    }

    /// 笛卡尔坐标转分数坐标
    ///
    /// 晶格退化（体积近似为零）时原样返回。
    pub fn cart_to_frac(&self, cart: [f64; 3]) -> [f64; 3] {
        let [a, b, c] = self.matrix;
        let det = self.volume();
        if det.abs() < 1e-10 {
            return cart;
        }

        // 逆矩阵的列就是倒易向量 / det
        let (bc, ca, ab) = (cross(b, c), cross(c, a), cross(a, b));
        [
            dot(cart, bc) / det,
            dot(cart, ca) / det,
            dot(cart, ab) / det,
        ]
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LatticeRepr {
    Matrix {
        matrix: [[f64; 3]; 3],
    },
    Parameters {
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    },
}

impl From<LatticeRepr> for Lattice {
    fn from(repr: LatticeRepr) -> Self {
        match repr {
            LatticeRepr::Matrix { matrix } => Lattice::from_vectors(matrix),
            LatticeRepr::Parameters {
                a,
                b,
                c,
                alpha,
                beta,
                gamma,
            } => Lattice::from_parameters(a, b, c, alpha, beta, gamma),
        }
    }
}

/// 原子信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    /// 元素符号
    pub element: String,

    /// 分数坐标 [x, y, z]
    pub position: [f64; 3],
}

impl Atom {
    pub fn new(element: impl Into<String>, position: [f64; 3]) -> Self {
        Atom {
            element: element.into(),
            position,
        }
    }
}

/// 晶体结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crystal {
    /// 结构名称
    pub name: String,

    /// 晶格
    pub lattice: Lattice,

    /// 原子列表
    pub atoms: Vec<Atom>,
}

impl Crystal {
    pub fn new(name: impl Into<String>, lattice: Lattice, atoms: Vec<Atom>) -> Self {
        Crystal {
            name: name.into(),
            lattice,
            atoms,
        }
    }

    pub fn num_sites(&self) -> usize {
        self.atoms.len()
    }

    /// 元素 -> 原子数，按元素符号排序
    pub fn composition(&self) -> BTreeMap<&str, usize> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for atom in &self.atoms {
            *counts.entry(atom.element.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// 计算化学式，元素按电负性排列，例如 `Na4Cl4`
    pub fn formula(&self) -> String {
        format_formula(self.composition().into_iter())
    }

    /// 约化化学式：各元素计数除以最大公约数，例如 `Si2` -> `Si`、`Ti2O4` -> `TiO2`
    pub fn reduced_formula(&self) -> String {
        let composition = self.composition();
        let divisor = composition.values().copied().fold(0, gcd).max(1);
        format_formula(
            composition
                .into_iter()
                .map(|(el, count)| (el, count / divisor)),
        )
    }

    /// 最小镜像约定下的最近邻距离
    ///
    /// 包括原子与自身周期镜像之间的距离，因此单原子晶胞返回最短的晶格平移。
    /// 没有原子时返回 `None`。
    ///
    /// 最近邻距离不超过最短晶格向量长度 `L`，长度不超过 `L` 的平移沿第 k 个
    /// 方向最多跨越 `L / d_k` 个晶胞（`d_k` 为面间距），据此确定镜像搜索范围，
    /// 高度倾斜的晶胞也能找到真正的最小镜像。
    pub fn nearest_neighbor_distance(&self) -> Option<f64> {
        let bound = self.lattice.lengths().into_iter().fold(f64::INFINITY, f64::min);
        let reach = self
            .lattice
            .plane_spacings()
            .map(|d| ((bound / d).ceil() as i32).clamp(0, MAX_IMAGE_REACH) + 1);

        let mut best: Option<f64> = None;
        for (i, ai) in self.atoms.iter().enumerate() {
            for aj in &self.atoms[i..] {
                let mut wrapped = [0.0; 3];
                for k in 0..3 {
                    let d = aj.position[k] - ai.position[k];
                    wrapped[k] = d - d.round();
                }
                for na in -reach[0]..=reach[0] {
                    for nb in -reach[1]..=reach[1] {
                        for nc in -reach[2]..=reach[2] {
                            let frac = [
                                wrapped[0] + na as f64,
                                wrapped[1] + nb as f64,
                                wrapped[2] + nc as f64,
                            ];
                            let dist = norm(self.lattice.frac_to_cart(frac));
                            if dist < 1e-8 {
                                continue;
                            }
                            best = Some(best.map_or(dist, |b| b.min(dist)));
                        }
                    }
                }
            }
        }
        best
    }
}

/// 镜像搜索沿单个方向的最大晶胞数，限制退化晶格下的搜索量
const MAX_IMAGE_REACH: i32 = 64;

fn format_formula<'a>(counts: impl Iterator<Item = (&'a str, usize)>) -> String {
    let mut counts: Vec<_> = counts.collect();
    counts.sort_by(|(a, _), (b, _)| formula_order(a, b));
    counts
        .into_iter()
        .map(|(el, count)| {
            if count == 1 {
                el.to_string()
            } else {
                format!("{}{}", el, count)
            }
        })
        .collect::<Vec<_>>()
        .join("")
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

pub(crate) fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}
