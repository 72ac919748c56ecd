use anyhow::Result;
use half::f16;
use ndarray::{ArrayD, IxDyn};

/// Raw output tensor of one detection layer.
///
/// Logically shaped `[batch, boxes, rows, cols, 5 + classes]`. The tensor is kept in
/// standard (row major, contiguous) layout so the decoders can walk it as a flat
/// buffer using the element strides.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLayerOutput {
    tensor: ArrayD<f32>,
}

impl RawLayerOutput {
    pub fn new(tensor: ArrayD<f32>) -> Self {
        let tensor = if tensor.is_standard_layout() {
            tensor
        } else {
            tensor.as_standard_layout().into_owned()
        };
        Self { tensor }
    }

    /// Builds a layer from a flat `f32` buffer.
    ///
    /// # Arguments
    ///
    /// * `shape` - The tensor shape, normally `[1, boxes, rows, cols, 5 + classes]`.
    /// * `data` - Row major values; its length must match the shape.
    pub fn from_shape_vec(shape: &[usize], data: Vec<f32>) -> Result<Self> {
        let tensor = ArrayD::from_shape_vec(IxDyn(shape), data)?;
        Ok(Self::new(tensor))
    }

    /// Builds a layer from half precision network output, widening every value once.
    pub fn from_f16(shape: &[usize], data: &[f16]) -> Result<Self> {
        let widened = data.iter().map(|x| x.to_f32()).collect::<Vec<f32>>();
        Self::from_shape_vec(shape, widened)
    }

    pub fn shape(&self) -> &[usize] {
        self.tensor.shape()
    }

    /// Element strides of every dimension.
    ///
    /// Standard layout never produces negative strides.
    pub fn strides(&self) -> Vec<usize> {
        self.tensor.strides().iter().map(|&s| s.max(0) as usize).collect()
    }

    /// The flat tensor buffer in memory order.
    pub fn as_slice(&self) -> &[f32] {
        self.tensor.as_slice().unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.tensor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensor.is_empty()
    }
}

impl From<ArrayD<f32>> for RawLayerOutput {
    fn from(tensor: ArrayD<f32>) -> Self {
        Self::new(tensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides_follow_row_major_shape() {
        let layer = RawLayerOutput::from_shape_vec(&[1, 3, 2, 4, 7], vec![0.; 3 * 2 * 4 * 7]).unwrap();
        assert_eq!(layer.shape(), &[1, 3, 2, 4, 7]);
        assert_eq!(layer.strides(), vec![168, 56, 28, 7, 1]);
        assert_eq!(layer.as_slice().len(), 168);
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        assert!(RawLayerOutput::from_shape_vec(&[1, 3, 2, 2, 6], vec![0.; 10]).is_err());
    }

    #[test]
    fn non_standard_layout_is_copied_to_row_major() {
        let tensor = ArrayD::from_shape_vec(IxDyn(&[2, 3]), vec![1., 2., 3., 4., 5., 6.]).unwrap();
        let layer = RawLayerOutput::new(tensor.reversed_axes());
        assert_eq!(layer.shape(), &[3, 2]);
        assert_eq!(layer.as_slice(), &[1., 4., 2., 5., 3., 6.]);
    }

    #[test]
    fn half_precision_is_widened() {
        let data = [f16::from_f32(0.5), f16::from_f32(-2.0)];
        let layer = RawLayerOutput::from_f16(&[2], &data).unwrap();
        assert_eq!(layer.as_slice(), &[0.5, -2.0]);
    }
}
