//! Ocean-surface phenology metrics from daily satellite grids
//!
//! The library re-exports the two workspace crates. With the `python` feature the crate also builds the `rsphen._lib` extension module.

pub use rsphen_components;
pub use rsphen_core;

#[cfg(feature = "python")]
mod python {
    use pyo3::prelude::*;
    use pyo3::wrap_pymodule;
    use rsphen_components::python::components;
    use rsphen_core::python::core;

    #[pymodule]
    #[pyo3(name = "_lib")]
    fn rsphen(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add("__version__", env!("CARGO_PKG_VERSION"))?;
        m.add_wrapped(wrap_pymodule!(core))?;
        m.add_wrapped(wrap_pymodule!(components))?;

        set_path(m, "rsphen._lib.core", "core")?;
        set_path(m, "rsphen._lib.components", "components")?;

        Ok(())
    }

    fn set_path(m: &Bound<'_, PyModule>, path: &str, module: &str) -> PyResult<()> {
        let code = format!(
            "\
import sys
sys.modules['{path}'] = {module}
    "
        );
        m.py().run_bound(&code, None, Some(&m.dict()))
    }
}
