/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

/// Load the first document of an inline yaml string.
#[cfg(test)]
macro_rules! yaml_doc {
    ($s:expr) => {
        yaml_rust::YamlLoader::load_from_str($s)
            .unwrap()
            .into_iter()
            .next()
            .unwrap()
    };
}
