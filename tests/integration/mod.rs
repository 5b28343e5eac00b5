// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod delivery_test;
pub mod realtime_test;
pub mod webhook_api_test;
