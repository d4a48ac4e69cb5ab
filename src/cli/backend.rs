use burn::backend::Autodiff;

/// The backend used for inference
#[cfg(not(feature = "tch"))]
pub type Backend = burn::backend::NdArray;

/// The backend used for inference
#[cfg(feature = "tch")]
pub type Backend = burn::backend::LibTorch;

/// The backend used for training
pub type Training = Autodiff<Backend>;

/// The device computation runs on
pub type Device = <Backend as burn::tensor::backend::Backend>::Device;

/// The default device of the selected backend
pub fn device() -> Device {
    Default::default()
}
