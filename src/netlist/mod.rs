// SPDX-License-Identifier: Apache-2.0

pub mod builder;
pub mod cone;
pub mod connectivity;
pub mod design;
