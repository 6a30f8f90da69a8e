//! Operation kernels shared by eager evaluation, tracing and replay.
//!
//! Every recorded [`Node`] is evaluated through [`eval`] and differentiated
//! through [`vjp`], so a traced graph replays with exactly the arithmetic that
//! produced it.

use crate::error::{MlError, Result};
use crate::tape::Var;
use crate::tensor::Tensor;

#[derive(Clone, Debug, PartialEq)]
pub enum EOp {
    Add,
    Sub,
    Mul,
    Div,
    Neg,
    AddScalar(f32),
    MulScalar(f32),
    Pow(f32),
    Exp,
    Sin,
    Cos,
    Tanh,
    Sqrt,
    Clamp { min: f32, max: f32 },
    Sum,
    /// `x[B, in] · w[out, in]ᵀ + b[out]`
    Linear,
    Reshape(Vec<usize>),
    Concat,
    Slice { start: usize, len: usize },
}

impl EOp {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            EOp::Add => "add",
            EOp::Sub => "sub",
            EOp::Mul => "mul",
            EOp::Div => "div",
            EOp::Neg => "neg",
            EOp::AddScalar(_) => "add_scalar",
            EOp::MulScalar(_) => "mul_scalar",
            EOp::Pow(_) => "pow",
            EOp::Exp => "exp",
            EOp::Sin => "sin",
            EOp::Cos => "cos",
            EOp::Tanh => "tanh",
            EOp::Sqrt => "sqrt",
            EOp::Clamp { .. } => "clamp",
            EOp::Sum => "sum",
            EOp::Linear => "linear",
            EOp::Reshape(_) => "reshape",
            EOp::Concat => "concat",
            EOp::Slice { .. } => "slice",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub op: EOp,
    pub inputs: Vec<Var>,
    pub out: Var,
}

/// Element `i` of `t`, treating single-element tensors as broadcast scalars.
fn at(t: &Tensor, i: usize) -> f32 {
    if t.len() == 1 { t.data[0] } else { t.data[i] }
}

fn slot(t: &Tensor, i: usize) -> usize {
    if t.len() == 1 { 0 } else { i }
}

fn broadcast_shape(op: &'static str, a: &Tensor, b: &Tensor) -> Result<Vec<usize>> {
    if a.shape == b.shape || b.len() == 1 {
        Ok(a.shape.clone())
    } else if a.len() == 1 {
        Ok(b.shape.clone())
    } else {
        Err(MlError::ShapeMismatch { op, lhs: a.shape.clone(), rhs: b.shape.clone() })
    }
}

fn binary(op: &'static str, a: &Tensor, b: &Tensor, f: impl Fn(f32, f32) -> f32) -> Result<Tensor> {
    let shape = broadcast_shape(op, a, b)?;
    let len = shape.iter().product();
    let data = (0..len).map(|i| f(at(a, i), at(b, i))).collect();
    Ok(Tensor { data, shape })
}

fn unary(a: &Tensor, f: impl Fn(f32) -> f32) -> Tensor {
    Tensor { data: a.data.iter().map(|&v| f(v)).collect(), shape: a.shape.clone() }
}

fn one<'a>(args: &[&'a Tensor]) -> Result<&'a Tensor> {
    match args {
        [a] => Ok(*a),
        _ => Err(MlError::ArityMismatch { expected: 1, got: args.len() }),
    }
}

fn two<'a>(args: &[&'a Tensor]) -> Result<(&'a Tensor, &'a Tensor)> {
    match args {
        [a, b] => Ok((*a, *b)),
        _ => Err(MlError::ArityMismatch { expected: 2, got: args.len() }),
    }
}

/// Computes the output of `op` applied to `args`.
pub fn eval(op: &EOp, args: &[&Tensor]) -> Result<Tensor> {
    match op {
        EOp::Add => {
            let (a, b) = two(args)?;
            binary("add", a, b, |x, y| x + y)
        }
        EOp::Sub => {
            let (a, b) = two(args)?;
            binary("sub", a, b, |x, y| x - y)
        }
        EOp::Mul => {
            let (a, b) = two(args)?;
            binary("mul", a, b, |x, y| x * y)
        }
        EOp::Div => {
            let (a, b) = two(args)?;
            binary("div", a, b, |x, y| x / y)
        }
        EOp::Neg => Ok(unary(one(args)?, |x| -x)),
        EOp::AddScalar(s) => Ok(unary(one(args)?, |x| x + s)),
        EOp::MulScalar(s) => Ok(unary(one(args)?, |x| x * s)),
        EOp::Pow(p) => Ok(unary(one(args)?, |x| x.powf(*p))),
        EOp::Exp => Ok(unary(one(args)?, f32::exp)),
        EOp::Sin => Ok(unary(one(args)?, f32::sin)),
        EOp::Cos => Ok(unary(one(args)?, f32::cos)),
        EOp::Tanh => Ok(unary(one(args)?, f32::tanh)),
        EOp::Sqrt => Ok(unary(one(args)?, f32::sqrt)),
        EOp::Clamp { min, max } => Ok(unary(one(args)?, |x| x.clamp(*min, *max))),
        EOp::Sum => Ok(Tensor::scalar(one(args)?.data.iter().sum())),
        EOp::Linear => linear(args),
        EOp::Reshape(shape) => {
            let a = one(args)?;
            if shape.iter().product::<usize>() != a.len() {
                return Err(MlError::ShapeMismatch { op: "reshape", lhs: a.shape.clone(), rhs: shape.clone() });
            }
            Ok(Tensor { data: a.data.clone(), shape: shape.clone() })
        }
        EOp::Concat => {
            let mut data = Vec::new();
            for a in args {
                if a.shape.len() != 1 {
                    return Err(MlError::ShapeMismatch { op: "concat", lhs: a.shape.clone(), rhs: vec![a.len()] });
                }
                data.extend_from_slice(&a.data);
            }
            Ok(Tensor { shape: vec![data.len()], data })
        }
        EOp::Slice { start, len } => {
            let a = one(args)?;
            if a.shape.len() != 1 || start + len > a.len() {
                return Err(MlError::ShapeMismatch { op: "slice", lhs: a.shape.clone(), rhs: vec![start + len] });
            }
            Ok(Tensor { data: a.data[*start..start + len].to_vec(), shape: vec![*len] })
        }
    }
}

fn linear(args: &[&Tensor]) -> Result<Tensor> {
    let [x, w, b] = args else {
        return Err(MlError::ArityMismatch { expected: 3, got: args.len() });
    };
    let (&[batch, in_dim], &[out_dim, w_in], &[b_len]) = (x.shape.as_slice(), w.shape.as_slice(), b.shape.as_slice())
    else {
        return Err(MlError::ShapeMismatch { op: "linear", lhs: x.shape.clone(), rhs: w.shape.clone() });
    };
    if in_dim != w_in {
        return Err(MlError::ShapeMismatch { op: "linear", lhs: x.shape.clone(), rhs: w.shape.clone() });
    }
    if b_len != out_dim {
        return Err(MlError::ShapeMismatch { op: "linear", lhs: w.shape.clone(), rhs: b.shape.clone() });
    }
    let mut y = vec![0.0f32; batch * out_dim];
    for k in 0..batch {
        let row = &x.data[k * in_dim..(k + 1) * in_dim];
        for o in 0..out_dim {
            let weights = &w.data[o * in_dim..(o + 1) * in_dim];
            let dot: f32 = weights.iter().zip(row).map(|(wv, xv)| wv * xv).sum();
            y[k * out_dim + o] = dot + b.data[o];
        }
    }
    Ok(Tensor { data: y, shape: vec![batch, out_dim] })
}

/// Vector-Jacobian product: gradients of each input given the gradient of
/// the output. `args` and `out` must be the values `eval` saw and produced.
#[must_use]
pub fn vjp(op: &EOp, args: &[&Tensor], out: &Tensor, grad: &[f32]) -> Vec<Vec<f32>> {
    match op {
        EOp::Add | EOp::Sub | EOp::Mul | EOp::Div => {
            let (a, b) = (args[0], args[1]);
            let mut ga = vec![0.0; a.len()];
            let mut gb = vec![0.0; b.len()];
            for (i, g) in grad.iter().enumerate() {
                let (x, y) = (at(a, i), at(b, i));
                let (da, db) = match op {
                    EOp::Add => (1.0, 1.0),
                    EOp::Sub => (1.0, -1.0),
                    EOp::Mul => (y, x),
                    _ => (1.0 / y, -x / (y * y)),
                };
                ga[slot(a, i)] += g * da;
                gb[slot(b, i)] += g * db;
            }
            vec![ga, gb]
        }
        EOp::Neg => vec![grad.iter().map(|g| -g).collect()],
        EOp::AddScalar(_) | EOp::Reshape(_) => vec![grad.to_vec()],
        EOp::MulScalar(s) => vec![grad.iter().map(|g| g * s).collect()],
        EOp::Pow(p) => vec![zip_map(&args[0].data, grad, |x, g| g * p * x.powf(p - 1.0))],
        EOp::Exp => vec![zip_map(&out.data, grad, |y, g| g * y)],
        EOp::Sin => vec![zip_map(&args[0].data, grad, |x, g| g * x.cos())],
        EOp::Cos => vec![zip_map(&args[0].data, grad, |x, g| -g * x.sin())],
        EOp::Tanh => vec![zip_map(&out.data, grad, |y, g| g * (1.0 - y * y))],
        EOp::Sqrt => vec![zip_map(&out.data, grad, |y, g| if y > 0.0 { 0.5 * g / y } else { 0.0 })],
        EOp::Clamp { min, max } => {
            vec![zip_map(&args[0].data, grad, |x, g| if (*min..=*max).contains(&x) { g } else { 0.0 })]
        }
        EOp::Sum => vec![vec![grad[0]; args[0].len()]],
        EOp::Linear => linear_vjp(args, grad),
        EOp::Concat => {
            let mut offset = 0;
            args.iter()
                .map(|a| {
                    let part = grad[offset..offset + a.len()].to_vec();
                    offset += a.len();
                    part
                })
                .collect()
        }
        EOp::Slice { start, len } => {
            let mut g = vec![0.0; args[0].len()];
            g[*start..start + len].copy_from_slice(grad);
            vec![g]
        }
    }
}

fn zip_map(values: &[f32], grad: &[f32], f: impl Fn(f32, f32) -> f32) -> Vec<f32> {
    values.iter().zip(grad).map(|(&v, &g)| f(v, g)).collect()
}

fn linear_vjp(args: &[&Tensor], grad: &[f32]) -> Vec<Vec<f32>> {
    let (x, w) = (args[0], args[1]);
    let (batch, in_dim) = (x.shape[0], x.shape[1]);
    let out_dim = w.shape[0];
    let mut gx = vec![0.0; x.len()];
    let mut gw = vec![0.0; w.len()];
    let mut gb = vec![0.0; out_dim];
    for k in 0..batch {
        for o in 0..out_dim {
            let go = grad[k * out_dim + o];
            if go == 0.0 {
                continue;
            }
            for i in 0..in_dim {
                gw[o * in_dim + i] += go * x.data[k * in_dim + i];
                gx[k * in_dim + i] += go * w.data[o * in_dim + i];
            }
            gb[o] += go;
        }
    }
    vec![gx, gw, gb]
}
