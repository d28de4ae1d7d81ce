// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod test {
    use itertools::Itertools;
    use sift_expr_test_util::{build_plan, init_logging};

    #[test]
    fn run() {
        init_logging();
        datadriven::walk("tests/testdata", |f| {
            f.run(move |s| -> String {
                match s.directive.as_str() {
                    // tests plan construction and EXPLAIN output
                    "build" => match build_plan(&s.input) {
                        Ok(plan) => plan.pretty(),
                        Err(err) => format!("error: {}\n", err),
                    },
                    // tests output column derivation
                    "outputs" => match build_plan(&s.input) {
                        Ok(plan) => format!(
                            "{}\n",
                            plan.output_columns()
                                .iter()
                                .map(|c| format!("{} {}", c, c.typ()))
                                .join(", ")
                        ),
                        Err(err) => format!("error: {}\n", err),
                    },
                    _ => panic!("unknown directive: {}", s.directive),
                }
            })
        });
    }
}
