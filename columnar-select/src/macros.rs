//! Macros used in the columnar-select

/// Call macro for all of the cell widths
///
/// Tuple: {enum variant name, number of bytes}
macro_rules! for_all_cell_widths {
    ($macro:ident) => {
        $macro! {
            {W1, 1},
            {W2, 2},
            {W4, 4},
            {W8, 8},
            {W16, 16}
        }
    };
}

pub(crate) use for_all_cell_widths;

/// Macro for building the func that is specialized for each [`PextMethod`]. The function
/// implementation is a generic function `func<P: Pext>(..)`, this macro instantiates it with
/// each backend inside a function that enables the target features the backend requires,
/// such that the compiler could inline the instruction into the loops.
///
/// Match pattern:
/// (\
///     &emsp; generic function that implements the computation,\
///     &emsp; ( parameters of the function ) -> return type\
/// )\
///
/// It generates `unsafe fn {func}_with(method: PextMethod, ..)`, caller should guarantee
/// the `method` is supported by the cpu.
///
/// [`PextMethod`]: crate::compute::pext::PextMethod
macro_rules! pext_func {
    ($func_impl:ident,
        ($($parameter:ident : $parameter_ty:ty),*) $(-> $ret:ty)?
        $(,)?
    ) => {
        paste::paste! {
            #[cfg(target_arch = "x86_64")]
            #[target_feature(enable = "bmi2")]
            #[inline]
            unsafe fn [<$func_impl _bmi2>]($($parameter:$parameter_ty,)*) $(-> $ret)? {
                // SAFETY: the target feature is enabled, the caller checked the cpu
                unsafe { $func_impl::<$crate::compute::pext::PextInstruction>($($parameter,)*) }
            }

            #[cfg(target_arch = "x86_64")]
            #[target_feature(enable = "pclmulqdq")]
            #[inline]
            unsafe fn [<$func_impl _clmul>]($($parameter:$parameter_ty,)*) $(-> $ret)? {
                // SAFETY: the target feature is enabled, the caller checked the cpu
                unsafe { $func_impl::<$crate::compute::pext::PextClmul>($($parameter,)*) }
            }

            #[cfg(target_arch = "aarch64")]
            #[target_feature(enable = "neon,aes")]
            #[inline]
            unsafe fn [<$func_impl _clmul>]($($parameter:$parameter_ty,)*) $(-> $ret)? {
                // SAFETY: the target feature is enabled, the caller checked the cpu
                unsafe { $func_impl::<$crate::compute::pext::PextClmul>($($parameter,)*) }
            }

            #[inline]
            fn [<$func_impl _simple>]($($parameter:$parameter_ty,)*) $(-> $ret)? {
                // SAFETY: simple implementation does not depend on any target feature
                unsafe { $func_impl::<$crate::compute::pext::PextSimple>($($parameter,)*) }
            }

            /// # Safety
            ///
            /// `method` must be supported by the cpu
            #[inline]
            #[allow(unreachable_patterns)]
            unsafe fn [<$func_impl _with>](
                method: $crate::compute::pext::PextMethod,
                $($parameter:$parameter_ty,)*
            ) $(-> $ret)? {
                #[cfg(feature = "verify")]
                assert!(method.is_supported());

                match method {
                    #[cfg(target_arch = "x86_64")]
                    $crate::compute::pext::PextMethod::Instruction => {
                        // SAFETY: caller guarantees bmi2 is supported
                        unsafe { [<$func_impl _bmi2>]($($parameter,)*) }
                    }
                    #[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
                    $crate::compute::pext::PextMethod::Clmul => {
                        // SAFETY: caller guarantees carry-less multiplication is supported
                        unsafe { [<$func_impl _clmul>]($($parameter,)*) }
                    }
                    $crate::compute::pext::PextMethod::Simple => {
                        [<$func_impl _simple>]($($parameter,)*)
                    }
                    _ => unreachable!("pext method `{method}` is not supported on this target"),
                }
            }
        }
    };
}

pub(crate) use pext_func;
