// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Fixed-function pipeline state applied per draw call.

/// The comparison function used for stencil testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunction {
    /// The test never passes.
    Never,
    /// The test passes if the reference is less than the stored value.
    Less,
    /// The test passes if the reference equals the stored value.
    Equal,
    /// The test passes if the reference is less than or equal to the stored value.
    LessEqual,
    /// The test passes if the reference is greater than the stored value.
    Greater,
    /// The test passes if the reference differs from the stored value.
    NotEqual,
    /// The test passes if the reference is greater than or equal to the stored value.
    GreaterEqual,
    /// The test always passes.
    #[default]
    Always,
}

/// An operation to perform on a stencil buffer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilOperation {
    /// Keep the existing stencil value.
    #[default]
    Keep,
    /// Set the stencil value to 0.
    Zero,
    /// Replace the stencil value with the reference value.
    Replace,
    /// Bitwise invert the stencil value.
    Invert,
    /// Increment the stencil value, clamping at the maximum value.
    IncrementClamp,
    /// Decrement the stencil value, clamping at 0.
    DecrementClamp,
}

/// Describes the stencil test and operations for a single face of a primitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StencilFaceState {
    /// The comparison function used for the stencil test.
    pub compare: CompareFunction,
    /// The operation to perform if the stencil test fails.
    pub fail_op: StencilOperation,
    /// The operation to perform if the stencil test passes but the depth test fails.
    pub depth_fail_op: StencilOperation,
    /// The operation to perform if both the stencil and depth tests pass.
    pub depth_pass_op: StencilOperation,
}

/// Stencil configuration carried by a material.
///
/// The reference value is not part of the state: it comes from each draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilState {
    /// Whether the stencil test runs at all.
    pub enabled: bool,
    /// State for front-facing primitives.
    pub front: StencilFaceState,
    /// State for back-facing primitives.
    pub back: StencilFaceState,
    /// Mask applied to stored and reference values before comparing.
    pub read_mask: u32,
    /// Mask applied to values written to the stencil buffer.
    pub write_mask: u32,
}

impl StencilState {
    /// Stencil testing turned off.
    pub const DISABLED: Self = Self {
        enabled: false,
        front: StencilFaceState {
            compare: CompareFunction::Always,
            fail_op: StencilOperation::Keep,
            depth_fail_op: StencilOperation::Keep,
            depth_pass_op: StencilOperation::Keep,
        },
        back: StencilFaceState {
            compare: CompareFunction::Always,
            fail_op: StencilOperation::Keep,
            depth_fail_op: StencilOperation::Keep,
            depth_pass_op: StencilOperation::Keep,
        },
        read_mask: 0xFF,
        write_mask: 0xFF,
    };

    /// Writes the draw call's reference value wherever a fragment passes.
    pub fn write_reference() -> Self {
        let face = StencilFaceState {
            compare: CompareFunction::Always,
            depth_pass_op: StencilOperation::Replace,
            ..Default::default()
        };
        Self {
            enabled: true,
            front: face,
            back: face,
            ..Self::DISABLED
        }
    }

    /// Passes only where the stored value equals the draw call's reference value.
    pub fn test_equal() -> Self {
        let face = StencilFaceState {
            compare: CompareFunction::Equal,
            ..Default::default()
        };
        Self {
            enabled: true,
            front: face,
            back: face,
            ..Self::DISABLED
        }
    }
}

impl Default for StencilState {
    fn default() -> Self {
        Self::DISABLED
    }
}
