/*
 * SPDX-FileCopyrightText: 2022 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::*;

#[test]
fn test_object_decode_ticks() {
    assert_eq!(object_decode_ticks(0, 0), 0);
    assert_eq!(object_decode_ticks(1, 1), 1);
    // 1000 x 100 pixels at 16 MB/s is 6.25 ms.
    assert_eq!(object_decode_ticks(1000, 100), 563);
}

#[test]
fn test_plane_initialization_ticks() {
    assert_eq!(plane_initialization_ticks(1920, 1080), 467);
    assert_eq!(plane_initialization_ticks(720, 480), 78);
}

#[test]
fn test_window_is_cheaper_than_object() {
    assert!(window_write_ticks(1000, 100) < object_decode_ticks(1000, 100));
}
